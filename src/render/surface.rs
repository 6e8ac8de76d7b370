/// 24-bit colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Drawing primitives the render engine needs
/// Coordinates are logical pixels, origin top-left, y growing downward
pub trait Surface {
    fn clear(&mut self, color: Rgb);
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgb);
    fn line(&mut self, from: (f64, f64), to: (f64, f64), color: Rgb);
    fn circle(&mut self, x: f64, y: f64, radius: f64, color: Rgb);
    /// `x, y` is the top-left of the text
    fn text(&mut self, x: f64, y: f64, text: &str, color: Rgb);
}

/// One recorded primitive
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Rgb),
    FillRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: Rgb,
    },
    Line {
        from: (f64, f64),
        to: (f64, f64),
        color: Rgb,
    },
    Circle {
        x: f64,
        y: f64,
        radius: f64,
        color: Rgb,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        color: Rgb,
    },
}

/// Surface that records primitives for a later paint pass
/// `clear` drops everything recorded so far
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn background(&self) -> Option<Rgb> {
        self.commands.iter().find_map(|command| match command {
            DrawCommand::Clear(color) => Some(*color),
            _ => None,
        })
    }

    pub fn rects_with_color(&self, wanted: Rgb) -> Vec<(f64, f64, f64, f64)> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::FillRect {
                    x,
                    y,
                    width,
                    height,
                    color,
                } if *color == wanted => Some((*x, *y, *width, *height)),
                _ => None,
            })
            .collect()
    }

    pub fn lines_with_color(&self, wanted: Rgb) -> Vec<((f64, f64), (f64, f64))> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Line { from, to, color } if *color == wanted => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    pub fn circles(&self) -> Vec<(f64, f64, f64)> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Circle { x, y, radius, .. } => Some((*x, *y, *radius)),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Surface for DrawList {
    fn clear(&mut self, color: Rgb) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear(color));
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgb) {
        self.commands.push(DrawCommand::FillRect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn line(&mut self, from: (f64, f64), to: (f64, f64), color: Rgb) {
        self.commands.push(DrawCommand::Line { from, to, color });
    }

    fn circle(&mut self, x: f64, y: f64, radius: f64, color: Rgb) {
        self.commands.push(DrawCommand::Circle {
            x,
            y,
            radius,
            color,
        });
    }

    fn text(&mut self, x: f64, y: f64, text: &str, color: Rgb) {
        self.commands.push(DrawCommand::Text {
            x,
            y,
            text: text.to_string(),
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_resets_recording() {
        let mut list = DrawList::new();
        list.fill_rect(0.0, 0.0, 10.0, 10.0, Rgb(1, 2, 3));
        list.text(1.0, 1.0, "hello", Rgb(255, 255, 255));
        list.clear(Rgb(30, 30, 30));

        assert_eq!(list.commands().len(), 1);
        assert_eq!(list.background(), Some(Rgb(30, 30, 30)));
        assert!(list.texts().is_empty());
    }

    #[test]
    fn test_filters() {
        let mut list = DrawList::new();
        list.clear(Rgb(0, 0, 0));
        list.fill_rect(1.0, 2.0, 3.0, 4.0, Rgb(9, 9, 9));
        list.fill_rect(5.0, 6.0, 7.0, 8.0, Rgb(1, 1, 1));
        list.line((0.0, 0.0), (1.0, 1.0), Rgb(9, 9, 9));
        list.circle(3.0, 4.0, 5.0, Rgb(9, 9, 9));

        assert_eq!(list.rects_with_color(Rgb(9, 9, 9)), vec![(1.0, 2.0, 3.0, 4.0)]);
        assert_eq!(list.lines_with_color(Rgb(9, 9, 9)).len(), 1);
        assert_eq!(list.circles(), vec![(3.0, 4.0, 5.0)]);
    }
}
