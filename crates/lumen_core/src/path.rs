//! Flat vector path representation

use smallvec::SmallVec;

use crate::geometry::{Point, Rect};
use crate::transform::Mat3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    QuadTo { control: Point, to: Point },
    CubicTo {
        control1: Point,
        control2: Point,
        to: Point,
    },
    Close,
}

impl PathCommand {
    fn map(self, f: impl Fn(Point) -> Point) -> PathCommand {
        match self {
            PathCommand::MoveTo(p) => PathCommand::MoveTo(f(p)),
            PathCommand::LineTo(p) => PathCommand::LineTo(f(p)),
            PathCommand::QuadTo { control, to } => PathCommand::QuadTo {
                control: f(control),
                to: f(to),
            },
            PathCommand::CubicTo {
                control1,
                control2,
                to,
            } => PathCommand::CubicTo {
                control1: f(control1),
                control2: f(control2),
                to: f(to),
            },
            PathCommand::Close => PathCommand::Close,
        }
    }
}

/// Elevate a quadratic segment `p0 -> (c) -> p` to cubic control points
pub fn quad_to_cubic(p0: Point, control: Point, p: Point) -> (Point, Point) {
    const TWO_THIRDS: f32 = 2.0 / 3.0;
    (p0.lerp(control, TWO_THIRDS), p.lerp(control, TWO_THIRDS))
}

/// A flat sequence of path commands
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    commands: SmallVec<[PathCommand; 16]>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_commands(commands: impl IntoIterator<Item = PathCommand>) -> Self {
        Self {
            commands: commands.into_iter().collect(),
        }
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn push(&mut self, command: PathCommand) {
        self.commands.push(command);
    }

    /// Bounding box of every point (control points included), `None` if the path
    /// has no geometry
    pub fn bounds(&self) -> Option<Rect> {
        let mut bounds: Option<Rect> = None;
        let mut add = |p: Point| {
            let r = Rect::new(p.x, p.y, 0.0, 0.0);
            bounds = Some(match bounds {
                Some(b) => b.union(&r),
                None => r,
            });
        };
        for command in &self.commands {
            match *command {
                PathCommand::MoveTo(p) | PathCommand::LineTo(p) => add(p),
                PathCommand::QuadTo { control, to } => {
                    add(control);
                    add(to);
                }
                PathCommand::CubicTo {
                    control1,
                    control2,
                    to,
                } => {
                    add(control1);
                    add(control2);
                    add(to);
                }
                PathCommand::Close => {}
            }
        }
        bounds
    }

    pub fn transformed(&self, transform: &Mat3) -> Path {
        Path {
            commands: self
                .commands
                .iter()
                .map(|c| c.map(|p| transform.transform_point(p)))
                .collect(),
        }
    }

    /// Copy with every quadratic segment rewritten as an equivalent cubic
    pub fn with_cubics(&self) -> Path {
        let mut out = SmallVec::with_capacity(self.commands.len());
        let mut start = Point::ZERO;
        let mut current = Point::ZERO;
        for command in &self.commands {
            match *command {
                PathCommand::MoveTo(p) => {
                    start = p;
                    current = p;
                    out.push(*command);
                }
                PathCommand::LineTo(p) => {
                    current = p;
                    out.push(*command);
                }
                PathCommand::QuadTo { control, to } => {
                    let (control1, control2) = quad_to_cubic(current, control, to);
                    out.push(PathCommand::CubicTo {
                        control1,
                        control2,
                        to,
                    });
                    current = to;
                }
                PathCommand::CubicTo { to, .. } => {
                    current = to;
                    out.push(*command);
                }
                PathCommand::Close => {
                    current = start;
                    out.push(*command);
                }
            }
        }
        Path { commands: out }
    }
}

/// Builder for constructing paths
#[derive(Clone, Debug, Default)]
pub struct PathBuilder {
    path: Path,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(mut self, x: f32, y: f32) -> Self {
        self.path.push(PathCommand::MoveTo(Point::new(x, y)));
        self
    }

    pub fn line_to(mut self, x: f32, y: f32) -> Self {
        self.path.push(PathCommand::LineTo(Point::new(x, y)));
        self
    }

    pub fn quad_to(mut self, cx: f32, cy: f32, x: f32, y: f32) -> Self {
        self.path.push(PathCommand::QuadTo {
            control: Point::new(cx, cy),
            to: Point::new(x, y),
        });
        self
    }

    pub fn cubic_to(mut self, c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32) -> Self {
        self.path.push(PathCommand::CubicTo {
            control1: Point::new(c1x, c1y),
            control2: Point::new(c2x, c2y),
            to: Point::new(x, y),
        });
        self
    }

    pub fn close(mut self) -> Self {
        self.path.push(PathCommand::Close);
        self
    }

    pub fn rect(self, rect: &Rect) -> Self {
        self.move_to(rect.x, rect.y)
            .line_to(rect.right(), rect.y)
            .line_to(rect.right(), rect.bottom())
            .line_to(rect.x, rect.bottom())
            .close()
    }

    pub fn build(self) -> Path {
        self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_include_controls() {
        let path = PathBuilder::new()
            .move_to(0.0, 0.0)
            .quad_to(10.0, -5.0, 20.0, 0.0)
            .close()
            .build();
        assert_eq!(path.bounds(), Some(Rect::new(0.0, -5.0, 20.0, 5.0)));
    }

    #[test]
    fn test_close_only_has_no_bounds() {
        let path = PathBuilder::new().close().close().build();
        assert_eq!(path.bounds(), None);
        assert!(Path::new().bounds().is_none());
    }

    #[test]
    fn test_quad_elevation() {
        let (c1, c2) = quad_to_cubic(
            Point::new(0.0, 0.0),
            Point::new(3.0, 3.0),
            Point::new(6.0, 0.0),
        );
        assert_eq!(c1, Point::new(2.0, 2.0));
        assert_eq!(c2, Point::new(4.0, 2.0));
    }

    #[test]
    fn test_with_cubics_tracks_current_point() {
        let path = PathBuilder::new()
            .move_to(0.0, 0.0)
            .line_to(6.0, 0.0)
            .quad_to(9.0, 3.0, 12.0, 0.0)
            .build()
            .with_cubics();
        assert_eq!(
            path.commands()[2],
            PathCommand::CubicTo {
                control1: Point::new(8.0, 2.0),
                control2: Point::new(10.0, 2.0),
                to: Point::new(12.0, 0.0),
            }
        );
    }

    #[test]
    fn test_transformed() {
        let path = PathBuilder::new().move_to(1.0, 1.0).line_to(2.0, 2.0).build();
        let moved = path.transformed(&Mat3::scale_translate(2.0, 2.0, 1.0, 0.0));
        assert_eq!(moved.commands()[1], PathCommand::LineTo(Point::new(5.0, 4.0)));
    }
}
