//! Content stream operator implementations.
//!
//! Operators are grouped by category:
//! - `graphics_state` - State stack, transforms and ExtGState (q, Q, cm, w, J, j, M, d, ri, i, gs)
//! - `color` - Color space and values (G, g, RG, rg, K, k, CS, cs, SC, SCN, sc, scn)
//! - `path` - Path construction and painting (m, l, c, v, y, h, re, S, s, f, F, f\*, B, B\*, b, b\*, n, W, W\*)
//! - `text` - Text state, showing and Type 3 metrics (BT, ET, Tc, Tw, Tz, TL, Tf, Tr, Ts, Td, TD, Tm, T\*, Tj, TJ, ', ", d0, d1)
//! - `xobject` - XObjects, inline images, shadings and marked content (Do, BI, sh, BMC, BDC, EMC)

mod color;
mod graphics_state;
mod path;
mod text;
mod xobject;

// Each file adds an impl block to ContentInterpreter, so nothing is re-exported.
