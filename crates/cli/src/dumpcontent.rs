//! dumpcontent - Interpret a content stream and dump its page objects
//!
//! Each input file holds decoded content stream bytes. The content is
//! drawn on a page of its own and the resulting objects are written as
//! JSON, or regenerated back into content with `--regenerate`.

use clap::{ArgAction, Parser};
use memmap2::Mmap;
use quire_core::model::objects::{Dictionary, PDFObject, PDFStream};
use quire_core::page::object::{PageObject, PageObjectKind, TextItem};
use quire_core::{ContentGenerator, ContentManager, Document, Page, ParseOptions, PdfError};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// One text run.
#[derive(Debug, Serialize)]
struct TextDump {
    font: String,
    size: f64,
    codes: Vec<u32>,
    kerning: Vec<f64>,
    origin: [f64; 2],
}

/// One page object.
#[derive(Debug, Serialize)]
struct ObjectDump {
    kind: &'static str,
    segment: Option<usize>,
    bbox: [f64; 4],
    matrix: [f64; 6],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    marks: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mcid: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fill_rgb: Option<[f64; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stroke_rgb: Option<[f64; 3]>,
    fill_alpha: f64,
    stroke_alpha: f64,
    blend_mode: &'static str,
    clipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<TextDump>,
    #[serde(skip_serializing_if = "String::is_empty")]
    resource: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<ObjectDump>,
}

/// Everything parsed from one input.
#[derive(Debug, Serialize)]
struct ContentDump {
    file: String,
    width: f64,
    height: f64,
    objects: Vec<ObjectDump>,
    segment_ctms: Vec<[f64; 6]>,
}

fn dump_object(obj: &PageObject) -> ObjectDump {
    let (a, b, c, d, e, f) = obj.matrix();
    let (x0, y0, x1, y1) = obj.bbox();
    let general = obj.general_state.get();
    let colors = obj.color_state.get();
    let text = obj.as_text().map(|text| {
        let state = obj.text_state.get();
        let kerning = text
            .items
            .iter()
            .filter_map(|item| match item {
                TextItem::Kerning(k) => Some(*k),
                TextItem::Glyph { .. } => None,
            })
            .collect();
        TextDump {
            font: state
                .font
                .as_ref()
                .map(|font| font.base_font().to_string())
                .unwrap_or_default(),
            size: state.font_size,
            codes: text.char_codes().collect(),
            kerning,
            origin: [text.pos.0, text.pos.1],
        }
    });
    let children = match &obj.kind {
        PageObjectKind::Form(form) => form.form.holder().iter().map(dump_object).collect(),
        _ => Vec::new(),
    };
    ObjectDump {
        kind: obj.type_name(),
        segment: obj.content_stream(),
        bbox: [x0, y0, x1, y1],
        matrix: [a, b, c, d, e, f],
        marks: obj.marks.items().iter().map(|m| m.tag.clone()).collect(),
        mcid: obj.marks.mcid(),
        fill_rgb: colors.fill_color.to_rgb().map(|(r, g, b)| [r, g, b]),
        stroke_rgb: colors.stroke_color.to_rgb().map(|(r, g, b)| [r, g, b]),
        fill_alpha: general.fill_alpha(),
        stroke_alpha: general.stroke_alpha(),
        blend_mode: general.blend_mode.name(),
        clipped: obj.clip_path.is_set(),
        text,
        resource: obj.resource_name().to_string(),
        children,
    }
}

/// Parse a `x0,y0,x1,y1` box.
fn parse_box(value: &str) -> Result<[f64; 4], String> {
    let numbers: Vec<f64> = value
        .split(',')
        .map(|n| n.trim().parse::<f64>().map_err(|e| format!("{n:?}: {e}")))
        .collect::<Result<_, _>>()?;
    <[f64; 4]>::try_from(numbers).map_err(|_| "expected four numbers".to_string())
}

/// A one-page document drawing `content`.
fn single_page_document(content: &[u8], mediabox: [f64; 4]) -> quire_core::Result<(Document, u32)> {
    let mut doc = Document::with_catalog();
    let contents = doc.add_object(PDFObject::Stream(Box::new(PDFStream::new(
        Dictionary::new(),
        content.to_vec(),
    ))));
    let mut page = Dictionary::new();
    page.insert("Contents".into(), PDFObject::Ref(contents));
    page.insert(
        "MediaBox".into(),
        PDFObject::Array(mediabox.iter().map(|v| PDFObject::Real(*v)).collect()),
    );
    let objid = doc.add_page(page)?.objid;
    Ok((doc, objid))
}

fn read_input(path: &Path) -> io::Result<Mmap> {
    let file = File::open(path)?;
    // SAFETY: the mapping is only read, and inputs are not expected to change
    // while the tool runs.
    unsafe { Mmap::map(&file) }
}

fn dump_content<W: Write>(out: &mut W, path: &Path, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let data = read_input(path)?;
    let (mut doc, objid) = single_page_document(&data, args.mediabox)?;
    let options = ParseOptions {
        slice_budget: args.slice_budget,
        max_form_depth: args.max_form_depth,
    };
    let mut page = Page::load(&doc, objid)?;
    page.parse_content(&doc, options);

    if args.regenerate {
        for obj in page.holder_mut().iter_mut() {
            obj.set_dirty(true);
        }
        ContentGenerator::new(&mut doc, page.holder_mut()).generate_content()?;
        let manager = ContentManager::for_page(&mut doc, objid);
        for index in 0..manager.stream_count() {
            let stream = manager
                .get_stream(index)
                .ok_or(PdfError::StreamIndexOutOfRange(index))?;
            out.write_all(stream.get_rawdata())?;
        }
        return Ok(());
    }

    let holder = page.holder();
    let dump = ContentDump {
        file: path.display().to_string(),
        width: page.width,
        height: page.height,
        objects: holder.iter().map(dump_object).collect(),
        segment_ctms: holder
            .all_ctms()
            .values()
            .map(|&(a, b, c, d, e, f)| [a, b, c, d, e, f])
            .collect(),
    };
    serde_json::to_writer_pretty(&mut *out, &dump)?;
    writeln!(out)?;
    Ok(())
}

/// Interpret content streams and dump the page objects they draw.
#[derive(Parser, Debug)]
#[command(name = "dumpcontent")]
#[command(author, version, about = "Dump the page objects drawn by a content stream", long_about = None)]
#[command(disable_version_flag = true)]
struct Args {
    /// One or more files holding decoded content stream bytes
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Print version information
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: (),

    /// Use debug logging level
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,

    /// Page box as x0,y0,x1,y1
    #[arg(long, value_parser = parse_box, default_value = "0,0,612,792")]
    mediabox: [f64; 4],

    /// Bytes interpreted per parse slice; 0 parses in one slice
    #[arg(long = "slice-budget", default_value_t = ParseOptions::default().slice_budget)]
    slice_budget: usize,

    /// Deepest form nesting that is still parsed
    #[arg(long = "max-form-depth", default_value_t = ParseOptions::default().max_form_depth)]
    max_form_depth: usize,

    /// Write the content regenerated from the parsed objects instead of JSON
    #[arg(short = 'g', long, action = ArgAction::SetTrue)]
    regenerate: bool,

    /// Path to file where output is written, or "-" for stdout
    #[arg(short = 'o', long, default_value = "-")]
    outfile: String,
}

fn main() -> core::result::Result<(), Box<dyn core::error::Error>> {
    let args = Args::parse();

    if args.debug {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("quire_core=debug"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }

    let mut output: Box<dyn Write> = if args.outfile == "-" {
        Box::new(BufWriter::new(io::stdout()))
    } else {
        let file = File::create(&args.outfile)?;
        Box::new(BufWriter::new(file))
    };

    for path in &args.files {
        if !path.exists() {
            eprintln!("Error: File not found: {}", path.display());
            std::process::exit(1);
        }
        dump_content(&mut output, path, &args)?;
    }

    output.flush()?;
    Ok(())
}
