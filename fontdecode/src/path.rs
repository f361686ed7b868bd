use std::fmt::Write;

use crate::tables::glyf::Point;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    QuadTo { cx: f64, cy: f64, x: f64, y: f64 },
    Close,
}

/// A glyph outline in font units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    commands: Vec<PathCommand>,
}

impl Path {
    pub fn new() -> Self {
        Path::default()
    }

    /// Builds the outline of TrueType contours. Two consecutive off-curve points imply an
    /// on-curve point halfway between them.
    pub fn from_contours(contours: &[Vec<Point>]) -> Self {
        let mut path = Path::new();
        for contour in contours {
            path.add_contour(contour);
        }
        path
    }

    fn add_contour(&mut self, contour: &[Point]) {
        let (first, last) = match (contour.first(), contour.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return,
        };

        let (start, rest) = if first.on_curve {
            ((first.x, first.y), &contour[1..])
        } else if last.on_curve {
            ((last.x, last.y), &contour[..contour.len() - 1])
        } else {
            (midpoint((first.x, first.y), (last.x, last.y)), contour)
        };

        self.move_to(start.0, start.1);
        let mut control: Option<(f64, f64)> = None;
        for point in rest {
            let to = (point.x, point.y);
            match (control, point.on_curve) {
                (Some(c), true) => {
                    self.quad_to(c.0, c.1, to.0, to.1);
                    control = None;
                }
                (None, true) => self.line_to(to.0, to.1),
                (Some(c), false) => {
                    let mid = midpoint(c, to);
                    self.quad_to(c.0, c.1, mid.0, mid.1);
                    control = Some(to);
                }
                (None, false) => control = Some(to),
            }
        }
        if let Some(c) = control {
            self.quad_to(c.0, c.1, start.0, start.1);
        }
        self.close();
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.commands.push(PathCommand::MoveTo { x, y });
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        self.commands.push(PathCommand::LineTo { x, y });
    }

    pub fn quad_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        self.commands.push(PathCommand::QuadTo { cx, cy, x, y });
    }

    pub fn close(&mut self) {
        self.commands.push(PathCommand::Close);
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Bounding box `[x_min, y_min, x_max, y_max]` of all points including control points.
    pub fn control_box(&self) -> Option<[f64; 4]> {
        let mut points = self.commands.iter().flat_map(|cmd| {
            let (first, second) = match *cmd {
                PathCommand::MoveTo { x, y } | PathCommand::LineTo { x, y } => {
                    (Some((x, y)), None)
                }
                PathCommand::QuadTo { cx, cy, x, y } => (Some((cx, cy)), Some((x, y))),
                PathCommand::Close => (None, None),
            };
            first.into_iter().chain(second)
        });
        let (x, y) = points.next()?;
        Some(points.fold([x, y, x, y], |[x0, y0, x1, y1], (x, y)| {
            [x0.min(x), y0.min(y), x1.max(x), y1.max(y)]
        }))
    }

    /// SVG path data of the outline.
    pub fn to_svg(&self) -> String {
        let mut svg = String::new();
        for cmd in &self.commands {
            // writing into a String cannot fail
            let _ = match *cmd {
                PathCommand::MoveTo { x, y } => write!(svg, "M{} {}", x, y),
                PathCommand::LineTo { x, y } => write!(svg, "L{} {}", x, y),
                PathCommand::QuadTo { cx, cy, x, y } => write!(svg, "Q{} {} {} {}", cx, cy, x, y),
                PathCommand::Close => write!(svg, "Z"),
            };
        }
        svg
    }
}

fn midpoint(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
}
