// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::mercator::{self, PixelPoint};
use crate::models::LatLng;
use crate::viewport::ZoomLevel;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

// below this many children the fan is a circle, from here on a spiral
const CIRCLE_SPIRAL_SWITCHOVER: usize = 9;
const CIRCLE_FOOT_SEPARATION: f64 = 25.0;
const CIRCLE_START_ANGLE: f64 = 0.0;
const SPIRAL_FOOT_SEPARATION: f64 = 28.0;
const SPIRAL_LENGTH_START: f64 = 11.0;
const SPIRAL_LENGTH_FACTOR: f64 = 5.0;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SpiderLeg {
    pub marker_id: String,
    /// Offset from the cluster centre, in screen pixels.
    pub offset: PixelPoint,
    pub position: LatLng,
}

pub fn fan_offsets(count: usize, multiplier: f64) -> Vec<PixelPoint> {
    if count >= CIRCLE_SPIRAL_SWITCHOVER {
        spiral_offsets(count, multiplier)
    } else {
        circle_offsets(count, multiplier)
    }
}

fn circle_offsets(count: usize, multiplier: f64) -> Vec<PixelPoint> {
    if count == 0 {
        return Vec::new();
    }
    let circumference = multiplier * CIRCLE_FOOT_SEPARATION * (2.0 + count as f64);
    let leg_length = circumference / (2.0 * PI);
    let angle_step = 2.0 * PI / count as f64;

    (0..count)
        .map(|i| {
            let angle = CIRCLE_START_ANGLE + i as f64 * angle_step;
            PixelPoint::new(leg_length * angle.cos(), leg_length * angle.sin())
        })
        .collect()
}

fn spiral_offsets(count: usize, multiplier: f64) -> Vec<PixelPoint> {
    let mut leg_length = multiplier * SPIRAL_LENGTH_START;
    let separation = multiplier * SPIRAL_FOOT_SEPARATION;
    let length_factor = multiplier * SPIRAL_LENGTH_FACTOR * 2.0 * PI;
    let mut angle = 0.0_f64;
    let mut offsets = vec![PixelPoint::new(0.0, 0.0); count];

    // walks outwards from the last leg so the first child ends up outermost
    for i in (0..=count).rev() {
        if i < count {
            offsets[i] = PixelPoint::new(leg_length * angle.cos(), leg_length * angle.sin());
        }
        angle += separation / leg_length + i as f64 * 0.0005;
        leg_length += length_factor / angle;
    }
    offsets
}

/// Lays `marker_ids` out around `center` at `zoom`.
pub fn spiderfy(
    marker_ids: &[String],
    center: LatLng,
    zoom: ZoomLevel,
    multiplier: f64,
) -> Vec<SpiderLeg> {
    let origin = mercator::project(center, zoom);
    marker_ids
        .iter()
        .zip(fan_offsets(marker_ids.len(), multiplier))
        .map(|(id, offset)| SpiderLeg {
            marker_id: id.clone(),
            offset,
            position: mercator::unproject(
                PixelPoint::new(origin.x + offset.x, origin.y + offset.y),
                zoom,
            ),
        })
        .collect()
}
