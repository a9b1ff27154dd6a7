//! The graphical-object model: the sum type every accepted statement
//! eventually appends to, per §3.

use crate::aperture::ApertureRef;
use crate::state::{GraphicsTransform, Point};

/// A single contour segment inside a region. Region segments never carry
/// an aperture snapshot (no aperture on region segments).
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Draw { origin: Point, endpoint: Point },
    Arc {
        origin: Point,
        endpoint: Point,
        offset: (i64, i64),
        is_cw: bool,
    },
}

impl Segment {
    pub fn origin(&self) -> Point {
        match self {
            Segment::Draw { origin, .. } => *origin,
            Segment::Arc { origin, .. } => *origin,
        }
    }

    pub fn endpoint(&self) -> Point {
        match self {
            Segment::Draw { endpoint, .. } => *endpoint,
            Segment::Arc { endpoint, .. } => *endpoint,
        }
    }

    fn translated(&self, dx: i64, dy: i64) -> Segment {
        match self {
            Segment::Draw { origin, endpoint } => Segment::Draw {
                origin: shift(*origin, dx, dy),
                endpoint: shift(*endpoint, dx, dy),
            },
            Segment::Arc {
                origin,
                endpoint,
                offset,
                is_cw,
            } => Segment::Arc {
                origin: shift(*origin, dx, dy),
                endpoint: shift(*endpoint, dx, dy),
                offset: *offset,
                is_cw: *is_cw,
            },
        }
    }
}

fn shift(p: Point, dx: i64, dy: i64) -> Point {
    Point {
        x: p.x + dx,
        y: p.y + dy,
    }
}

/// A fully resolved graphical object, with value-copy snapshots of the
/// aperture and transform in effect at the moment of emission.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphicalObject {
    Draw {
        aperture_snapshot: ApertureRef,
        transform_snapshot: GraphicsTransform,
        origin: Point,
        endpoint: Point,
    },
    Arc {
        aperture_snapshot: ApertureRef,
        transform_snapshot: GraphicsTransform,
        origin: Point,
        endpoint: Point,
        offset: (i64, i64),
        is_cw: bool,
    },
    Flash {
        aperture_snapshot: ApertureRef,
        transform_snapshot: GraphicsTransform,
        origin: Point,
    },
    Region {
        transform_snapshot: GraphicsTransform,
        segments: Vec<Segment>,
        contours: Vec<(usize, usize)>,
    },
    StepAndRepeat {
        nx: u32,
        ny: u32,
        step_x: f64,
        step_y: f64,
        objects: Vec<GraphicalObject>,
    },
}

impl GraphicalObject {
    /// Shift this object (and, for container variants, everything it
    /// contains) by `(dx, dy)`. Used to expand a step-and-repeat grid or a
    /// block-aperture flash onto the points where they're replicated.
    pub fn translate(&self, dx: i64, dy: i64) -> GraphicalObject {
        match self {
            GraphicalObject::Draw {
                aperture_snapshot,
                transform_snapshot,
                origin,
                endpoint,
            } => GraphicalObject::Draw {
                aperture_snapshot: aperture_snapshot.clone(),
                transform_snapshot: *transform_snapshot,
                origin: shift(*origin, dx, dy),
                endpoint: shift(*endpoint, dx, dy),
            },
            GraphicalObject::Arc {
                aperture_snapshot,
                transform_snapshot,
                origin,
                endpoint,
                offset,
                is_cw,
            } => GraphicalObject::Arc {
                aperture_snapshot: aperture_snapshot.clone(),
                transform_snapshot: *transform_snapshot,
                origin: shift(*origin, dx, dy),
                endpoint: shift(*endpoint, dx, dy),
                offset: *offset,
                is_cw: *is_cw,
            },
            GraphicalObject::Flash {
                aperture_snapshot,
                transform_snapshot,
                origin,
            } => GraphicalObject::Flash {
                aperture_snapshot: aperture_snapshot.clone(),
                transform_snapshot: *transform_snapshot,
                origin: shift(*origin, dx, dy),
            },
            GraphicalObject::Region {
                transform_snapshot,
                segments,
                contours,
            } => GraphicalObject::Region {
                transform_snapshot: *transform_snapshot,
                segments: segments.iter().map(|s| s.translated(dx, dy)).collect(),
                contours: contours.clone(),
            },
            GraphicalObject::StepAndRepeat {
                nx,
                ny,
                step_x,
                step_y,
                objects,
            } => GraphicalObject::StepAndRepeat {
                nx: *nx,
                ny: *ny,
                step_x: *step_x,
                step_y: *step_y,
                objects: objects.iter().map(|o| o.translate(dx, dy)).collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aperture::Aperture;
    use std::rc::Rc;

    #[test]
    fn translate_shifts_flash_origin() {
        let flash = GraphicalObject::Flash {
            aperture_snapshot: Rc::new(Aperture::Circle {
                diameter: 1.0,
                hole: None,
            }),
            transform_snapshot: GraphicsTransform::default(),
            origin: Point { x: 10, y: 20 },
        };
        let moved = flash.translate(5, -5);
        match moved {
            GraphicalObject::Flash { origin, .. } => {
                assert_eq!(origin, Point { x: 15, y: 15 });
            }
            _ => panic!("expected Flash"),
        }
    }

    #[test]
    fn translate_recurses_into_step_and_repeat() {
        let inner = GraphicalObject::Flash {
            aperture_snapshot: Rc::new(Aperture::Circle {
                diameter: 1.0,
                hole: None,
            }),
            transform_snapshot: GraphicsTransform::default(),
            origin: Point { x: 0, y: 0 },
        };
        let sr = GraphicalObject::StepAndRepeat {
            nx: 2,
            ny: 1,
            step_x: 100.0,
            step_y: 0.0,
            objects: vec![inner],
        };
        let moved = sr.translate(100, 0);
        match moved {
            GraphicalObject::StepAndRepeat { objects, .. } => match &objects[0] {
                GraphicalObject::Flash { origin, .. } => {
                    assert_eq!(*origin, Point { x: 100, y: 0 });
                }
                _ => panic!("expected Flash"),
            },
            _ => panic!("expected StepAndRepeat"),
        }
    }
}
