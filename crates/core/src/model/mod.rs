//! PDF model types - objects, graphics state records, colors and geometry.
//!
//! - `objects` - PDF object types (PDFObject, PDFStream, PDFObjRef)
//! - `state` - Copy-on-write graphics state sub-records
//! - `color` - Color spaces and color values
//! - `pattern` - Tiling and shading patterns
//! - `path` - Path geometry
//! - `clip` - Clipping paths
//! - `marks` - Marked-content tags

pub mod clip;
pub mod color;
pub mod marks;
pub mod objects;
pub mod path;
pub mod pattern;
pub mod state;

pub use clip::{ClipPath, ClipPathData};
pub use color::{Color, ColorSpaceFamily, PDFColorSpace};
pub use marks::{ContentMarkItem, ContentMarks, ContentMarksStack, MarkParams};
pub use objects::{Dictionary, PDFObjRef, PDFObject, PDFStream};
pub use path::{FillType, Path, PathPoint, PointType};
pub use pattern::{Pattern, ShadingPattern, ShadingType};
pub use state::{
    BlendMode, ColorState, GeneralState, GraphState, LineCap, LineJoin, RenderingIntent,
    SharedState, StateRecord, TextRenderingMode, TextState,
};
