//! Filled path meshes via lyon

use lumen_core::{Path, PathCommand, Point};
use lyon::lyon_tessellation::{
    BuffersBuilder, FillOptions, FillTessellator, FillVertex, VertexBuffers,
};
use lyon::math::point;
use lyon::path::PathEvent;

use crate::uniforms::Vertex;

const TOLERANCE: f32 = 0.1;

/// Indexed triangle list for one path
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

fn lp(p: Point) -> lyon::math::Point {
    point(p.x, p.y)
}

fn open(events: &mut Vec<PathEvent>, first: &mut Option<Point>, current: Point) {
    if first.is_none() {
        events.push(PathEvent::Begin { at: lp(current) });
        *first = Some(current);
    }
}

/// Subpaths start at the current point when no MoveTo precedes a segment
fn path_events(path: &Path) -> Vec<PathEvent> {
    let mut events = Vec::with_capacity(path.len() + 2);
    let mut first: Option<Point> = None;
    let mut current = Point::ZERO;

    for command in path.commands() {
        match *command {
            PathCommand::MoveTo(p) => {
                if let Some(start) = first.take() {
                    events.push(PathEvent::End {
                        last: lp(current),
                        first: lp(start),
                        close: false,
                    });
                }
                events.push(PathEvent::Begin { at: lp(p) });
                first = Some(p);
                current = p;
            }
            PathCommand::LineTo(to) => {
                open(&mut events, &mut first, current);
                events.push(PathEvent::Line {
                    from: lp(current),
                    to: lp(to),
                });
                current = to;
            }
            PathCommand::QuadTo { control, to } => {
                open(&mut events, &mut first, current);
                events.push(PathEvent::Quadratic {
                    from: lp(current),
                    ctrl: lp(control),
                    to: lp(to),
                });
                current = to;
            }
            PathCommand::CubicTo {
                control1,
                control2,
                to,
            } => {
                open(&mut events, &mut first, current);
                events.push(PathEvent::Cubic {
                    from: lp(current),
                    ctrl1: lp(control1),
                    ctrl2: lp(control2),
                    to: lp(to),
                });
                current = to;
            }
            PathCommand::Close => {
                if let Some(start) = first.take() {
                    events.push(PathEvent::End {
                        last: lp(current),
                        first: lp(start),
                        close: true,
                    });
                    current = start;
                }
            }
        }
    }

    if let Some(start) = first {
        events.push(PathEvent::End {
            last: lp(current),
            first: lp(start),
            close: false,
        });
    }
    events
}

/// Tessellate `path` for a non-zero fill. Failures yield an empty mesh.
pub fn fill(path: &Path) -> Mesh {
    let events = path_events(path);
    if events.is_empty() {
        return Mesh::default();
    }

    let mut geometry: VertexBuffers<Vertex, u32> = VertexBuffers::new();
    let mut tessellator = FillTessellator::new();
    let options = FillOptions::non_zero().with_tolerance(TOLERANCE);

    let result = tessellator.tessellate(
        events.iter().cloned(),
        &options,
        &mut BuffersBuilder::new(&mut geometry, |vertex: FillVertex| {
            let p = vertex.position();
            Vertex::new(p.x, p.y, 0.0, 0.0)
        }),
    );

    if let Err(err) = result {
        tracing::warn!("path fill tessellation failed: {err:?}");
        return Mesh::default();
    }

    Mesh {
        vertices: geometry.vertices,
        indices: geometry.indices,
    }
}
