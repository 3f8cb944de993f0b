//! Graphics state stack for the content stream interpreter.
//!
//! Implements the part of the PDF graphics state model a grayscale
//! rasterizer needs: a stack of states managed by `q` (save) and `Q`
//! (restore), the CTM via `cm`, line width, and fill/stroke colors reduced
//! to luminance.

use tiny_skia::Transform;

/// One level of graphics state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphicsState {
    /// Current transformation matrix (user space to page space).
    pub ctm: Transform,
    /// Stroke line width in user space units.
    pub line_width: f32,
    /// Non-stroking color as luminance in `0.0..=1.0` (0 is black).
    pub fill_gray: f32,
    /// Stroking color as luminance in `0.0..=1.0`.
    pub stroke_gray: f32,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Transform::identity(),
            line_width: 1.0,
            fill_gray: 0.0,
            stroke_gray: 0.0,
        }
    }
}

/// Full interpreter state: the current graphics state plus the `q`/`Q` stack.
#[derive(Debug, Clone, Default)]
pub struct InterpreterState {
    current: GraphicsState,
    stack: Vec<GraphicsState>,
}

impl InterpreterState {
    /// Create a state with the given base transform (page space to device).
    pub fn with_base(base: Transform) -> Self {
        Self {
            current: GraphicsState {
                ctm: base,
                ..GraphicsState::default()
            },
            stack: Vec::new(),
        }
    }

    pub fn current(&self) -> &GraphicsState {
        &self.current
    }

    pub fn ctm(&self) -> Transform {
        self.current.ctm
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// `q`
    pub fn save_state(&mut self) {
        self.stack.push(self.current);
    }

    /// `Q`. Returns `false` (and leaves the state alone) on an unbalanced restore.
    pub fn restore_state(&mut self) -> bool {
        match self.stack.pop() {
            Some(saved) => {
                self.current = saved;
                true
            }
            None => false,
        }
    }

    /// `cm`: the new matrix applies before the current CTM.
    pub fn concat_matrix(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        let m = Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32);
        self.current.ctm = self.current.ctm.pre_concat(m);
    }

    pub fn set_line_width(&mut self, width: f64) {
        self.current.line_width = width.max(0.0) as f32;
    }

    pub fn set_fill_components(&mut self, components: &[f32]) {
        if let Some(gray) = luminance(components) {
            self.current.fill_gray = gray;
        }
    }

    pub fn set_stroke_components(&mut self, components: &[f32]) {
        if let Some(gray) = luminance(components) {
            self.current.stroke_gray = gray;
        }
    }
}

/// Reduce gray, RGB or CMYK components to luminance.
///
/// Other component counts (pattern names, separations) leave the color
/// unchanged.
pub fn luminance(components: &[f32]) -> Option<f32> {
    let c = |i: usize| components[i].clamp(0.0, 1.0);
    let gray = match components.len() {
        1 => c(0),
        3 => 0.299 * c(0) + 0.587 * c(1) + 0.114 * c(2),
        4 => {
            let k = 1.0 - c(3);
            let (r, g, b) = ((1.0 - c(0)) * k, (1.0 - c(1)) * k, (1.0 - c(2)) * k);
            0.299 * r + 0.587 * g + 0.114 * b
        }
        _ => return None,
    };
    Some(gray)
}
