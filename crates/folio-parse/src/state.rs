//! Graphics and text state for the content stream interpreter.
//!
//! The PDF graphics state model: a stack of states managed by `q` (save)
//! and `Q` (restore), CTM management via `cm`, device colors, and the text
//! state parameters that travel with the graphics state. The text and line
//! matrices live outside the stack and are reset by `BT`.

use folio_core::{Color, Ctm};

/// Parameters saved and restored by `q`/`Q`.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsState {
    pub ctm: Ctm,
    pub line_width: f64,
    pub stroke_color: Color,
    pub fill_color: Color,
    pub font_name: Option<String>,
    pub font_size: f64,
    /// `Tc`, in unscaled text space units.
    pub char_spacing: f64,
    /// `Tw`, applied to single-byte code 32.
    pub word_spacing: f64,
    /// `Tz` as a fraction (100% = 1.0).
    pub h_scaling: f64,
    pub leading: f64,
    pub rise: f64,
    /// `Tr` text rendering mode, 0 to 7.
    pub render_mode: u8,
}

impl GraphicsState {
    fn with_ctm(ctm: Ctm) -> Self {
        Self {
            ctm,
            line_width: 1.0,
            stroke_color: Color::default(),
            fill_color: Color::default(),
            font_name: None,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scaling: 1.0,
            leading: 0.0,
            rise: 0.0,
            render_mode: 0,
        }
    }

    /// Whether shown glyphs leave ink: modes 3 (invisible) and 7 (clip
    /// only) do not.
    pub fn paints_glyphs(&self) -> bool {
        !matches!(self.render_mode, 3 | 7)
    }
}

/// Full interpreter state: the current graphics state, its saved stack,
/// and the text object matrices.
#[derive(Debug, Clone)]
pub struct InterpreterState {
    current: GraphicsState,
    stack: Vec<GraphicsState>,
    text_matrix: Ctm,
    line_matrix: Ctm,
    in_text_object: bool,
}

impl InterpreterState {
    /// Create a state whose CTM starts at `initial_ctm`.
    pub fn new(initial_ctm: Ctm) -> Self {
        Self {
            current: GraphicsState::with_ctm(initial_ctm),
            stack: Vec::new(),
            text_matrix: Ctm::identity(),
            line_matrix: Ctm::identity(),
            in_text_object: false,
        }
    }

    pub fn gs(&self) -> &GraphicsState {
        &self.current
    }

    pub fn gs_mut(&mut self) -> &mut GraphicsState {
        &mut self.current
    }

    pub fn ctm(&self) -> &Ctm {
        &self.current.ctm
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    // --- q/Q operators ---

    /// `q` operator: save the current graphics state onto the stack.
    pub fn save_state(&mut self) {
        self.stack.push(self.current.clone());
    }

    /// `Q` operator: restore the most recently saved graphics state.
    ///
    /// Returns `false` if the stack is empty (unbalanced Q).
    pub fn restore_state(&mut self) -> bool {
        match self.stack.pop() {
            Some(saved) => {
                self.current = saved;
                true
            }
            None => false,
        }
    }

    /// `cm` operator: CTM' = matrix × CTM.
    pub fn concat_matrix(&mut self, m: Ctm) {
        self.current.ctm = m.concat(&self.current.ctm);
    }

    /// Set a color from a component list, inferring the space from its length.
    pub fn set_color(&mut self, stroking: bool, components: &[f32]) {
        let color = color_from_components(components);
        if stroking {
            self.current.stroke_color = color;
        } else {
            self.current.fill_color = color;
        }
    }

    // --- Text object ---

    /// `BT`: reset both text matrices to identity.
    pub fn begin_text(&mut self) {
        self.in_text_object = true;
        self.text_matrix = Ctm::identity();
        self.line_matrix = Ctm::identity();
    }

    /// `ET`
    pub fn end_text(&mut self) {
        self.in_text_object = false;
    }

    pub fn in_text_object(&self) -> bool {
        self.in_text_object
    }

    pub fn text_matrix(&self) -> &Ctm {
        &self.text_matrix
    }

    /// `Tm`: replaces (not concatenates) both matrices.
    pub fn set_text_matrix(&mut self, m: Ctm) {
        self.text_matrix = m;
        self.line_matrix = m;
    }

    /// `Td`: offset from the start of the current line.
    pub fn move_text_position(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Ctm::translation(tx, ty).concat(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    /// `TD`: `-ty TL` then `tx ty Td`.
    pub fn move_text_position_and_set_leading(&mut self, tx: f64, ty: f64) {
        self.current.leading = -ty;
        self.move_text_position(tx, ty);
    }

    /// `T*`: equivalent to `0 -TL Td`.
    pub fn move_to_next_line(&mut self) {
        let leading = self.current.leading;
        self.move_text_position(0.0, -leading);
    }

    /// Translate the text matrix horizontally in text space after a glyph.
    pub fn advance_text_position(&mut self, tx: f64) {
        self.text_matrix = Ctm::translation(tx, 0.0).concat(&self.text_matrix);
    }

    /// Text rendering matrix for the current glyph origin:
    /// `[fs*Th 0 0 fs 0 rise] × Tm × CTM`.
    pub fn text_rendering_matrix(&self) -> Ctm {
        let gs = &self.current;
        let params = Ctm::new(gs.font_size * gs.h_scaling, 0.0, 0.0, gs.font_size, 0.0, gs.rise);
        params.concat(&self.text_matrix).concat(&gs.ctm)
    }
}

fn color_from_components(components: &[f32]) -> Color {
    match components {
        [g] => Color::Gray(*g),
        [r, g, b] => Color::Rgb(*r, *g, *b),
        [c, m, y, k] => Color::Cmyk(*c, *m, *y, *k),
        _ => Color::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_new_defaults() {
        let state = InterpreterState::new(Ctm::identity());
        assert_eq!(state.gs().line_width, 1.0);
        assert_eq!(state.gs().fill_color, Color::Gray(0.0));
        assert_eq!(state.gs().h_scaling, 1.0);
        assert_eq!(state.stack_depth(), 0);
        assert!(!state.in_text_object());
    }

    #[test]
    fn test_save_restore_round_trip() {
        let mut state = InterpreterState::new(Ctm::identity());
        state.save_state();
        state.concat_matrix(Ctm::new(2.0, 0.0, 0.0, 2.0, 10.0, 20.0));
        state.gs_mut().line_width = 5.0;
        state.gs_mut().char_spacing = 3.0;
        assert!(state.restore_state());
        assert_eq!(*state.ctm(), Ctm::identity());
        assert_eq!(state.gs().line_width, 1.0);
        assert_eq!(state.gs().char_spacing, 0.0);
    }

    #[test]
    fn test_render_mode_travels_with_graphics_state() {
        let mut state = InterpreterState::new(Ctm::identity());
        assert!(state.gs().paints_glyphs());
        state.save_state();
        state.gs_mut().render_mode = 3;
        assert!(!state.gs().paints_glyphs());
        assert!(state.restore_state());
        assert!(state.gs().paints_glyphs());
    }

    #[test]
    fn test_unbalanced_restore() {
        let mut state = InterpreterState::new(Ctm::identity());
        assert!(!state.restore_state());
    }

    #[test]
    fn test_concat_matrix_premultiplies() {
        let mut state = InterpreterState::new(Ctm::translation(100.0, 0.0));
        state.concat_matrix(Ctm::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0));
        let p = state.ctm().transform_point(folio_core::Point::new(1.0, 1.0));
        assert_approx(p.x, 102.0);
        assert_approx(p.y, 2.0);
    }

    #[test]
    fn test_color_from_component_count() {
        let mut state = InterpreterState::new(Ctm::identity());
        state.set_color(false, &[0.5]);
        assert_eq!(state.gs().fill_color, Color::Gray(0.5));
        state.set_color(true, &[1.0, 0.0, 0.0]);
        assert_eq!(state.gs().stroke_color, Color::Rgb(1.0, 0.0, 0.0));
        state.set_color(true, &[0.0, 0.0, 0.0, 1.0]);
        assert_eq!(state.gs().stroke_color, Color::Cmyk(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_td_and_t_star() {
        let mut state = InterpreterState::new(Ctm::identity());
        state.begin_text();
        state.move_text_position_and_set_leading(10.0, -14.0);
        assert_eq!(state.gs().leading, 14.0);
        state.move_to_next_line();
        assert_approx(state.text_matrix().e, 10.0);
        assert_approx(state.text_matrix().f, -28.0);
    }

    #[test]
    fn test_advance_keeps_line_matrix() {
        let mut state = InterpreterState::new(Ctm::identity());
        state.begin_text();
        state.set_text_matrix(Ctm::translation(72.0, 700.0));
        state.advance_text_position(6.0);
        assert_approx(state.text_matrix().e, 78.0);
        state.move_text_position(0.0, -12.0);
        assert_approx(state.text_matrix().e, 72.0);
        assert_approx(state.text_matrix().f, 688.0);
    }

    #[test]
    fn test_text_rendering_matrix_applies_size_and_rise() {
        let mut state = InterpreterState::new(Ctm::identity());
        state.gs_mut().font_size = 12.0;
        state.gs_mut().rise = 3.0;
        state.begin_text();
        state.set_text_matrix(Ctm::translation(50.0, 100.0));
        let trm = state.text_rendering_matrix();
        assert_approx(trm.a, 12.0);
        assert_approx(trm.d, 12.0);
        assert_approx(trm.e, 50.0);
        assert_approx(trm.f, 103.0);
    }
}
