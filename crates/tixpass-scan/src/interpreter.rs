//! Content stream interpreter.
//!
//! Interprets tokenized PDF content stream operators, maintaining the
//! graphics state and emitting path and image events to a
//! [`ContentHandler`]. Handles Form XObject recursion via the `Do` operator.
//! Text showing operators are ignored: barcodes drawn with fonts are covered
//! by the text-pattern fallback instead.

use tiny_skia::PathBuilder;
use tracing::{debug, warn};

use crate::error::ScanError;
use crate::handler::{ContentHandler, FillRule, ImageEvent, PaintOp, PathEvent};
use crate::images::{declared_size, decode_image_xobject, decode_inline_image, within_pixel_budget};
use crate::interpreter_state::InterpreterState;
use crate::tokenizer::{Operand, Operator, tokenize};

/// Path under construction, with the current point needed by `v`.
#[derive(Default)]
struct PathState {
    builder: PathBuilder,
    current: Option<(f32, f32)>,
    start: Option<(f32, f32)>,
}

impl PathState {
    fn move_to(&mut self, x: f32, y: f32) {
        self.builder.move_to(x, y);
        self.current = Some((x, y));
        self.start = Some((x, y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        if self.current.is_none() {
            self.move_to(x, y);
            return;
        }
        self.builder.line_to(x, y);
        self.current = Some((x, y));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x3: f32, y3: f32) {
        if self.current.is_none() {
            self.move_to(x1, y1);
        }
        self.builder.cubic_to(x1, y1, x2, y2, x3, y3);
        self.current = Some((x3, y3));
    }

    fn rectangle(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.move_to(x, y);
        self.builder.line_to(x + w, y);
        self.builder.line_to(x + w, y + h);
        self.builder.line_to(x, y + h);
        self.close();
    }

    fn close(&mut self) {
        if self.current.is_some() {
            self.builder.close();
            self.current = self.start;
        }
    }

    /// Take the finished path, leaving an empty builder behind.
    fn take(&mut self) -> Option<tiny_skia::Path> {
        self.current = None;
        self.start = None;
        std::mem::take(&mut self.builder).finish()
    }
}

/// Interpret a content stream and emit events to the handler.
///
/// # Arguments
///
/// * `doc` - The lopdf document (for resolving references)
/// * `stream_bytes` - Decoded content stream bytes
/// * `resources` - Resources dictionary for this scope
/// * `handler` - Event callback handler
/// * `max_depth` - Maximum Form XObject nesting; deeper forms are skipped
/// * `depth` - Current recursion depth (0 for page-level)
/// * `state` - Current graphics state
pub(crate) fn interpret_content_stream(
    doc: &lopdf::Document,
    stream_bytes: &[u8],
    resources: &lopdf::Dictionary,
    handler: &mut dyn ContentHandler,
    max_depth: usize,
    depth: usize,
    state: &mut InterpreterState,
) -> Result<(), ScanError> {
    let operators = tokenize(stream_bytes)?;
    let mut path = PathState::default();

    for op in &operators {
        match op.name.as_str() {
            // --- Graphics state operators ---
            "q" => state.save_state(),
            "Q" => {
                state.restore_state();
            }
            "cm" => {
                if let Some(m) = op.numbers(6) {
                    state.concat_matrix(m[0], m[1], m[2], m[3], m[4], m[5]);
                }
            }
            "w" => {
                if let Some(v) = op.f64_at(0) {
                    state.set_line_width(v);
                }
            }

            // --- Color operators ---
            "g" | "rg" | "k" | "sc" | "scn" => state.set_fill_components(&components(op)),
            "G" | "RG" | "K" | "SC" | "SCN" => state.set_stroke_components(&components(op)),
            "cs" => state.set_fill_components(&[0.0]),
            "CS" => state.set_stroke_components(&[0.0]),

            // --- Path construction operators ---
            "m" => {
                if let Some(p) = op.numbers(2) {
                    path.move_to(p[0] as f32, p[1] as f32);
                }
            }
            "l" => {
                if let Some(p) = op.numbers(2) {
                    path.line_to(p[0] as f32, p[1] as f32);
                }
            }
            "c" => {
                if let Some(p) = op.numbers(6) {
                    let p: Vec<f32> = p.into_iter().map(|v| v as f32).collect();
                    path.curve_to(p[0], p[1], p[2], p[3], p[4], p[5]);
                }
            }
            "v" => {
                if let Some(p) = op.numbers(4) {
                    let p: Vec<f32> = p.into_iter().map(|v| v as f32).collect();
                    let (x1, y1) = path.current.unwrap_or((p[0], p[1]));
                    path.curve_to(x1, y1, p[0], p[1], p[2], p[3]);
                }
            }
            "y" => {
                if let Some(p) = op.numbers(4) {
                    let p: Vec<f32> = p.into_iter().map(|v| v as f32).collect();
                    path.curve_to(p[0], p[1], p[2], p[3], p[2], p[3]);
                }
            }
            "re" => {
                if let Some(r) = op.numbers(4) {
                    path.rectangle(r[0] as f32, r[1] as f32, r[2] as f32, r[3] as f32);
                }
            }
            "h" => path.close(),

            // --- Path painting operators ---
            "S" => paint(handler, state, &mut path, PaintOp::Stroke, FillRule::NonZeroWinding),
            "s" => {
                path.close();
                paint(handler, state, &mut path, PaintOp::Stroke, FillRule::NonZeroWinding);
            }
            "f" | "F" => paint(handler, state, &mut path, PaintOp::Fill, FillRule::NonZeroWinding),
            "f*" => paint(handler, state, &mut path, PaintOp::Fill, FillRule::EvenOdd),
            "B" => paint(
                handler,
                state,
                &mut path,
                PaintOp::FillAndStroke,
                FillRule::NonZeroWinding,
            ),
            "B*" => paint(handler, state, &mut path, PaintOp::FillAndStroke, FillRule::EvenOdd),
            "b" => {
                path.close();
                paint(
                    handler,
                    state,
                    &mut path,
                    PaintOp::FillAndStroke,
                    FillRule::NonZeroWinding,
                );
            }
            "b*" => {
                path.close();
                paint(handler, state, &mut path, PaintOp::FillAndStroke, FillRule::EvenOdd);
            }
            "n" => {
                path.take();
            }

            // Clipping is not applied.
            "W" | "W*" => {}

            // --- XObject operator ---
            "Do" => {
                if let Some(name) = op.operands.first().and_then(Operand::as_name) {
                    handle_do(doc, resources, handler, max_depth, depth, state, name)?;
                }
            }

            // --- Inline image operator ---
            "BI" => handle_inline_image(op, state, handler),

            _ => {}
        }
    }

    Ok(())
}

/// Numeric operands of a color operator. Trailing pattern names are dropped.
fn components(op: &Operator) -> Vec<f32> {
    op.operands
        .iter()
        .filter_map(Operand::as_f64)
        .map(|v| v as f32)
        .collect()
}

fn paint(
    handler: &mut dyn ContentHandler,
    state: &InterpreterState,
    path: &mut PathState,
    paint_op: PaintOp,
    fill_rule: FillRule,
) {
    let Some(finished) = path.take() else {
        return;
    };
    if !handler.wants_paths() {
        return;
    }
    let gs = state.current();
    handler.on_path_painted(PathEvent {
        path: finished,
        paint_op,
        fill_rule,
        ctm: gs.ctm,
        line_width: gs.line_width,
        fill_gray: gs.fill_gray,
        stroke_gray: gs.stroke_gray,
    });
}

// --- Do operator: XObject handling ---

fn handle_do(
    doc: &lopdf::Document,
    resources: &lopdf::Dictionary,
    handler: &mut dyn ContentHandler,
    max_depth: usize,
    depth: usize,
    state: &mut InterpreterState,
    name: &str,
) -> Result<(), ScanError> {
    let Some(stream) = lookup_xobject(doc, resources, name) else {
        debug!(xobject = name, "XObject not found in resources");
        return Ok(());
    };

    let subtype = stream
        .dict
        .get(b"Subtype")
        .and_then(|o| o.as_name())
        .unwrap_or(b"");

    match subtype {
        b"Form" => handle_form_xobject(doc, stream, name, resources, handler, max_depth, depth, state),
        b"Image" => {
            let (width, height) = declared_size(&stream.dict);
            if !within_pixel_budget(width, height, handler.max_image_pixels()) {
                debug!(xobject = name, width, height, "skipping oversized image XObject");
            } else if handler.wants_images() {
                match decode_image_xobject(doc, stream) {
                    Ok(image) => handler.on_image(ImageEvent {
                        name: name.to_string(),
                        ctm: state.ctm(),
                        image,
                    }),
                    Err(e) => debug!(xobject = name, error = %e, "skipping image XObject"),
                }
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Resolve `/Resources/XObject/<name>` to its stream.
fn lookup_xobject<'a>(
    doc: &'a lopdf::Document,
    resources: &'a lopdf::Dictionary,
    name: &str,
) -> Option<&'a lopdf::Stream> {
    let xobjects = resources.get(b"XObject").ok()?;
    let (_, xobjects) = doc.dereference(xobjects).ok()?;
    let entry = xobjects.as_dict().ok()?.get(name.as_bytes()).ok()?;
    let (_, entry) = doc.dereference(entry).ok()?;
    entry.as_stream().ok()
}

#[allow(clippy::too_many_arguments)]
fn handle_form_xobject(
    doc: &lopdf::Document,
    stream: &lopdf::Stream,
    name: &str,
    parent_resources: &lopdf::Dictionary,
    handler: &mut dyn ContentHandler,
    max_depth: usize,
    depth: usize,
    state: &mut InterpreterState,
) -> Result<(), ScanError> {
    if depth + 1 > max_depth {
        warn!(
            xobject = name,
            depth = depth + 1,
            limit = max_depth,
            "Form XObject recursion depth exceeds limit; skipping"
        );
        return Ok(());
    }

    state.save_state();

    // Apply /Matrix if present (transforms form space to parent space)
    if let Ok(arr) = stream.dict.get(b"Matrix").and_then(|o| o.as_array()) {
        let vals: Option<Vec<f64>> = arr.iter().map(|o| o.as_float().ok().map(f64::from)).collect();
        if let Some(m) = vals.filter(|v| v.len() == 6) {
            state.concat_matrix(m[0], m[1], m[2], m[3], m[4], m[5]);
        }
    }

    // Form resources, falling back to the parent's
    let form_resources = stream
        .dict
        .get(b"Resources")
        .ok()
        .and_then(|o| doc.dereference(o).ok())
        .and_then(|(_, o)| o.as_dict().ok())
        .unwrap_or(parent_resources);

    let result = match decode_stream(stream) {
        Ok(content) => interpret_content_stream(
            doc,
            &content,
            form_resources,
            handler,
            max_depth,
            depth + 1,
            state,
        ),
        Err(e) => {
            debug!(xobject = name, error = %e, "skipping undecodable Form XObject");
            Ok(())
        }
    };

    state.restore_state();
    result
}

/// Decode a content stream, decompressing if needed.
pub(crate) fn decode_stream(stream: &lopdf::Stream) -> Result<Vec<u8>, ScanError> {
    if stream.dict.get(b"Filter").is_ok() {
        stream
            .decompressed_content()
            .map_err(|e| ScanError::Parse(format!("failed to decompress content stream: {e}")))
    } else {
        Ok(stream.content.clone())
    }
}

/// Handle an inline image (`BI`/`ID`/`EI`).
fn handle_inline_image(op: &Operator, state: &InterpreterState, handler: &mut dyn ContentHandler) {
    let Some(inline) = op.inline_image.as_ref() else {
        return;
    };
    if !handler.wants_images() {
        return;
    }
    match decode_inline_image(inline) {
        Ok(image) => handler.on_image(ImageEvent {
            name: "inline".to_string(),
            ctm: state.ctm(),
            image,
        }),
        Err(e) => debug!(error = %e, "skipping inline image"),
    }
}
