//! The object-builder stack: a stack of collectors where the bottom frame
//! is the top-level object list and a region, aperture block, or
//! step-and-repeat group temporarily pushes a new collector on top. See
//! §4.6/§4.7/§5.

use crate::error::ErrorKind;
use crate::object::{GraphicalObject, Segment};
use crate::state::{ApertureId, GraphicsTransform};

#[derive(Debug)]
enum Collector {
    TopLevel(Vec<GraphicalObject>),
    Region {
        transform: GraphicsTransform,
        segments: Vec<Segment>,
        contours: Vec<(usize, usize)>,
        contour_start: usize,
    },
    Block {
        id: ApertureId,
        objects: Vec<GraphicalObject>,
    },
    StepAndRepeat {
        nx: u32,
        ny: u32,
        step_x: f64,
        step_y: f64,
        objects: Vec<GraphicalObject>,
    },
}

/// The builder stack. Never empty: the bottom frame is the top-level
/// collector and is never popped.
#[derive(Debug)]
pub(crate) struct ObjectBuilder {
    stack: Vec<Collector>,
}

impl ObjectBuilder {
    pub(crate) fn new() -> Self {
        ObjectBuilder {
            stack: vec![Collector::TopLevel(Vec::new())],
        }
    }

    /// True while a region collector is on top of the stack.
    pub(crate) fn in_region(&self) -> bool {
        matches!(self.stack.last(), Some(Collector::Region { .. }))
    }

    pub(crate) fn push_region(&mut self, transform: GraphicsTransform) {
        self.stack.push(Collector::Region {
            transform,
            segments: Vec::new(),
            contours: Vec::new(),
            contour_start: 0,
        });
    }

    pub(crate) fn push_block(&mut self, id: ApertureId) {
        self.stack.push(Collector::Block {
            id,
            objects: Vec::new(),
        });
    }

    pub(crate) fn push_step_and_repeat(&mut self, nx: u32, ny: u32, step_x: f64, step_y: f64) {
        self.stack.push(Collector::StepAndRepeat {
            nx,
            ny,
            step_x,
            step_y,
            objects: Vec::new(),
        });
    }

    /// Append a non-region object (`Draw`/`Arc`/`Flash` outside a region,
    /// or a closed `Region`/nested `StepAndRepeat`) to the collector
    /// currently on top.
    pub(crate) fn append_object(&mut self, object: GraphicalObject) -> Result<(), ErrorKind> {
        match self.stack.last_mut() {
            Some(Collector::TopLevel(objects))
            | Some(Collector::Block { objects, .. })
            | Some(Collector::StepAndRepeat { objects, .. }) => {
                objects.push(object);
                Ok(())
            }
            Some(Collector::Region { .. }) => Err(ErrorKind::Region(
                "only draw/arc segments may be appended inside a region".into(),
            )),
            None => unreachable!("builder stack is never empty"),
        }
    }

    /// Append a `D01` segment while a region is open, breaking the contour
    /// whenever the incoming origin doesn't continue the previous segment's
    /// endpoint, per §4.6.
    pub(crate) fn append_segment(&mut self, segment: Segment) -> Result<(), ErrorKind> {
        match self.stack.last_mut() {
            Some(Collector::Region {
                segments,
                contours,
                contour_start,
                ..
            }) => {
                if let Some(prev) = segments.last() {
                    if prev.endpoint() != segment.origin() {
                        contours.push((*contour_start, segments.len() - *contour_start));
                        *contour_start = segments.len();
                    }
                }
                segments.push(segment);
                Ok(())
            }
            _ => Err(ErrorKind::Region("not inside a region".into())),
        }
    }

    /// Close the region on top of the stack, finalizing its trailing
    /// contour, and return it as a `GraphicalObject::Region` for the caller
    /// to append to the collector now on top.
    pub(crate) fn pop_region(&mut self) -> Result<GraphicalObject, ErrorKind> {
        match self.stack.pop() {
            Some(Collector::Region {
                transform,
                segments,
                mut contours,
                contour_start,
            }) => {
                if segments.len() > contour_start {
                    contours.push((contour_start, segments.len() - contour_start));
                }
                Ok(GraphicalObject::Region {
                    transform_snapshot: transform,
                    segments,
                    contours,
                })
            }
            other => {
                if let Some(c) = other {
                    self.stack.push(c);
                }
                Err(ErrorKind::Region("no open region to close".into()))
            }
        }
    }

    /// Close the block aperture on top of the stack, returning its id and
    /// contained objects.
    pub(crate) fn pop_block(&mut self) -> Result<(ApertureId, Vec<GraphicalObject>), ErrorKind> {
        match self.stack.pop() {
            Some(Collector::Block { id, objects }) => Ok((id, objects)),
            other => {
                if let Some(c) = other {
                    self.stack.push(c);
                }
                Err(ErrorKind::Region("no open aperture block to close".into()))
            }
        }
    }

    /// Close the step-and-repeat group on top of the stack, returning the
    /// finished object.
    pub(crate) fn pop_step_and_repeat(&mut self) -> Result<GraphicalObject, ErrorKind> {
        match self.stack.pop() {
            Some(Collector::StepAndRepeat {
                nx,
                ny,
                step_x,
                step_y,
                objects,
            }) => Ok(GraphicalObject::StepAndRepeat {
                nx,
                ny,
                step_x,
                step_y,
                objects,
            }),
            other => {
                if let Some(c) = other {
                    self.stack.push(c);
                }
                Err(ErrorKind::Region("no open step-and-repeat to close".into()))
            }
        }
    }

    /// True if only the top-level collector remains.
    pub(crate) fn at_top_level(&self) -> bool {
        self.stack.len() == 1
    }

    /// Consume the builder, returning the finished top-level object list.
    /// Only valid once every nested collector has been closed.
    pub(crate) fn into_top_level(mut self) -> Vec<GraphicalObject> {
        match self.stack.pop() {
            Some(Collector::TopLevel(objects)) if self.stack.is_empty() => objects,
            _ => unreachable!("caller must ensure all collectors are closed before finishing"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Point;

    fn pt(x: i64, y: i64) -> Point {
        Point { x, y }
    }

    #[test]
    fn region_with_two_contours_partitions_segments() {
        let mut builder = ObjectBuilder::new();
        builder.push_region(GraphicsTransform::default());

        builder
            .append_segment(Segment::Draw {
                origin: pt(100_000, 100_000),
                endpoint: pt(500_000, 100_000),
            })
            .unwrap();
        builder
            .append_segment(Segment::Draw {
                origin: pt(500_000, 100_000),
                endpoint: pt(300_000, 400_000),
            })
            .unwrap();
        builder
            .append_segment(Segment::Draw {
                origin: pt(300_000, 400_000),
                endpoint: pt(100_000, 100_000),
            })
            .unwrap();

        // Discontinuous: starts a new contour.
        builder
            .append_segment(Segment::Draw {
                origin: pt(0, 200_000),
                endpoint: pt(0, 400_000),
            })
            .unwrap();
        builder
            .append_segment(Segment::Draw {
                origin: pt(0, 400_000),
                endpoint: pt(200_000, 400_000),
            })
            .unwrap();
        builder
            .append_segment(Segment::Draw {
                origin: pt(200_000, 400_000),
                endpoint: pt(200_000, 200_000),
            })
            .unwrap();
        builder
            .append_segment(Segment::Draw {
                origin: pt(200_000, 200_000),
                endpoint: pt(0, 200_000),
            })
            .unwrap();

        let region = builder.pop_region().unwrap();
        match region {
            GraphicalObject::Region { segments, contours, .. } => {
                assert_eq!(segments.len(), 7);
                assert_eq!(contours, vec![(0, 3), (3, 4)]);
            }
            _ => panic!("expected Region"),
        }
    }

    #[test]
    fn append_object_rejected_inside_region() {
        let mut builder = ObjectBuilder::new();
        builder.push_region(GraphicsTransform::default());
        let flash = GraphicalObject::Flash {
            aperture_snapshot: std::rc::Rc::new(crate::aperture::Aperture::Circle {
                diameter: 1.0,
                hole: None,
            }),
            transform_snapshot: GraphicsTransform::default(),
            origin: pt(0, 0),
        };
        assert!(builder.append_object(flash).is_err());
    }
}
