//! Path construction and painting operators.
//!
//! Handles: m, l, c, v, y, h, re, S, s, f, F, f*, B, B*, b, b*, n, W, W*
//!
//! Construction operators only collect points. A painting operator turns
//! them into a path object (unless it paints nothing) and applies any
//! pending `W`/`W*` to the clip.

use std::mem;

use crate::interp::interpreter::ContentInterpreter;
use crate::model::path::{FillType, Path, PathPoint, PointType};
use crate::page::object::{PageObjectKind, PathObject};
use crate::parser::lexer::{ContentLexer, Element};
use crate::utils::{Point, is_identity, mult_matrix};

#[allow(non_snake_case)]
impl ContentInterpreter<'_> {
    // ========================================================================
    // Point collection
    // ========================================================================

    pub(crate) fn add_path_point(&mut self, point: Point, kind: PointType) {
        // A repeated move to the current point is a no-op.
        if kind == PointType::Move
            && let Some(last) = self.path_points.last()
            && last.is_open(PointType::Move)
            && self.path_current == point
        {
            return;
        }
        self.path_current = point;
        if kind == PointType::Move {
            self.path_start = point;
            if let Some(last) = self.path_points.last_mut()
                && last.is_open(PointType::Move)
            {
                last.point = point;
                return;
            }
        } else if self.path_points.is_empty() {
            return;
        }
        self.path_points.push(PathPoint::new(point, kind, false));
    }

    pub(crate) fn add_path_point_and_close(&mut self, point: Point, kind: PointType) {
        self.path_current = point;
        if self.path_points.is_empty() {
            return;
        }
        self.path_points.push(PathPoint::new(point, kind, true));
    }

    pub(crate) fn add_path_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.add_path_point((x, y), PointType::Move);
        self.add_path_point((x + w, y), PointType::Line);
        self.add_path_point((x + w, y + h), PointType::Line);
        self.add_path_point((x, y + h), PointType::Line);
        self.add_path_point_and_close((x, y), PointType::Line);
    }

    // ========================================================================
    // Construction operators
    // ========================================================================

    /// PDF operator: `m`
    pub fn do_m(&mut self, p: Point) {
        self.add_path_point(p, PointType::Move);
    }

    /// PDF operator: `l`
    pub fn do_l(&mut self, p: Point) {
        self.add_path_point(p, PointType::Line);
    }

    /// PDF operator: `c`
    pub fn do_c(&mut self, p1: Point, p2: Point, p3: Point) {
        self.add_path_point(p1, PointType::Bezier);
        self.add_path_point(p2, PointType::Bezier);
        self.add_path_point(p3, PointType::Bezier);
    }

    /// Curve whose first control point is the current point.
    ///
    /// PDF operator: `v`
    pub fn do_v(&mut self, p2: Point, p3: Point) {
        self.add_path_point(self.path_current, PointType::Bezier);
        self.add_path_point(p2, PointType::Bezier);
        self.add_path_point(p3, PointType::Bezier);
    }

    /// Curve whose second control point is the end point.
    ///
    /// PDF operator: `y`
    pub fn do_y(&mut self, p1: Point, p3: Point) {
        self.add_path_point(p1, PointType::Bezier);
        self.add_path_point(p3, PointType::Bezier);
        self.add_path_point(p3, PointType::Bezier);
    }

    /// PDF operator: `h`
    pub fn do_h(&mut self) {
        let Some(last) = self.path_points.last_mut() else {
            return;
        };
        if self.path_start != self.path_current {
            self.add_path_point_and_close(self.path_start, PointType::Line);
        } else {
            last.close = true;
        }
    }

    /// PDF operator: `re`
    pub fn do_re(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.add_path_rect(x, y, w, h);
    }

    /// Reads the construction operators that follow an `m` without going
    /// through the operand buffer. Stops at the first element that is not
    /// a number or a construction operator and rewinds to the last
    /// processed operator so the main loop sees it.
    pub(crate) fn parse_path_object(&mut self, lexer: &mut ContentLexer<'_>) {
        let mut params = [0.0f64; 6];
        let mut nparams = 0;
        let mut last_pos = lexer.tell();
        loop {
            let element = lexer.next_element();
            let processed = match element {
                Element::EndOfData => {
                    self.sync_position(lexer);
                    return;
                }
                Element::Keyword(word) => {
                    let done = match word {
                        b"m" => {
                            self.add_path_point((params[0], params[1]), PointType::Move);
                            true
                        }
                        b"l" => {
                            self.add_path_point((params[0], params[1]), PointType::Line);
                            true
                        }
                        b"c" => {
                            self.add_path_point((params[0], params[1]), PointType::Bezier);
                            self.add_path_point((params[2], params[3]), PointType::Bezier);
                            self.add_path_point((params[4], params[5]), PointType::Bezier);
                            true
                        }
                        b"v" => {
                            self.add_path_point(self.path_current, PointType::Bezier);
                            self.add_path_point((params[0], params[1]), PointType::Bezier);
                            self.add_path_point((params[2], params[3]), PointType::Bezier);
                            true
                        }
                        b"y" => {
                            self.add_path_point((params[0], params[1]), PointType::Bezier);
                            self.add_path_point((params[2], params[3]), PointType::Bezier);
                            self.add_path_point((params[2], params[3]), PointType::Bezier);
                            true
                        }
                        b"h" => {
                            self.do_h();
                            true
                        }
                        b"re" => {
                            self.add_path_rect(params[0], params[1], params[2], params[3]);
                            true
                        }
                        _ => false,
                    };
                    if done {
                        nparams = 0;
                        last_pos = lexer.tell();
                    }
                    done
                }
                Element::Number(number) => {
                    if nparams < params.len() {
                        params[nparams] = number.value;
                        nparams += 1;
                    }
                    true
                }
                Element::Name(_) | Element::Object(_) => false,
            };
            if !processed {
                lexer.set_pos(last_pos);
                self.sync_position(lexer);
                return;
            }
            self.sync_position(lexer);
        }
    }

    // ========================================================================
    // Painting operators
    // ========================================================================

    /// PDF operator: `S`
    pub fn do_S(&mut self) {
        self.add_path_object(FillType::NoFill, true);
    }

    /// PDF operator: `s`
    pub fn do_s(&mut self) {
        self.do_h();
        self.do_S();
    }

    /// PDF operator: `f`
    pub fn do_f(&mut self) {
        self.add_path_object(FillType::Winding, false);
    }

    /// Same as `f`, kept for old producers.
    ///
    /// PDF operator: `F`
    pub fn do_F(&mut self) {
        self.do_f();
    }

    /// PDF operator: `f*`
    pub fn do_f_star(&mut self) {
        self.add_path_object(FillType::EvenOdd, false);
    }

    /// PDF operator: `B`
    pub fn do_B(&mut self) {
        self.add_path_object(FillType::Winding, true);
    }

    /// PDF operator: `B*`
    pub fn do_B_star(&mut self) {
        self.add_path_object(FillType::EvenOdd, true);
    }

    /// PDF operator: `b`
    pub fn do_b(&mut self) {
        self.do_h();
        self.do_B();
    }

    /// PDF operator: `b*`
    pub fn do_b_star(&mut self) {
        self.do_h();
        self.do_B_star();
    }

    /// Ends the path without painting; a pending clip still applies.
    ///
    /// PDF operator: `n`
    pub fn do_n(&mut self) {
        self.add_path_object(FillType::NoFill, false);
    }

    /// PDF operator: `W`
    pub fn do_W(&mut self) {
        self.path_clip_type = FillType::Winding;
    }

    /// PDF operator: `W*`
    pub fn do_W_star(&mut self) {
        self.path_clip_type = FillType::EvenOdd;
    }

    /// Turns the collected points into a path object and applies any
    /// pending clip. The point list and clip rule are reset either way.
    pub(crate) fn add_path_object(&mut self, fill: FillType, stroke: bool) {
        let mut points = mem::take(&mut self.path_points);
        let clip_type = mem::replace(&mut self.path_clip_type, FillType::NoFill);
        if points.is_empty() {
            return;
        }
        if points.len() == 1 {
            // A lone move clips everything away.
            if clip_type != FillType::NoFill {
                let mut empty = Path::new();
                empty.append_rect(0.0, 0.0, 0.0, 0.0);
                self.states
                    .clip_path
                    .make_mut()
                    .append_path_with_auto_merge(empty, FillType::Winding);
            }
            return;
        }
        if points.last().is_some_and(|p| p.is_open(PointType::Move)) {
            points.pop();
        }

        let path = Path::from_points(points);
        let matrix = mult_matrix(self.states.ctm, self.content_to_user);
        if stroke || fill != FillType::NoFill {
            let mut obj = self.new_object(PageObjectKind::Path(PathObject {
                path: path.clone(),
                fill_type: fill,
                stroke,
                matrix,
            }));
            self.set_graphic_states(&mut obj, true, false, true);
            obj.calc_bounding_box();
            self.holder.append(obj);
        }
        if clip_type != FillType::NoFill {
            let mut clip = path;
            if !is_identity(matrix) {
                clip.transform(matrix);
            }
            self.states
                .clip_path
                .make_mut()
                .append_path_with_auto_merge(clip, clip_type);
        }
    }
}
