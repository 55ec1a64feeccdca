//! Sensor Relay: remote lidar sweep -> host lidar frame
//!
//! Points arrive as packed little-endian `f32` triples (plus optional trailing
//! channels covered by the stride) in the remote's left-handed frame.

use bytemuck::pod_read_unaligned;
use contracts::{
    LidarFrame, LidarPoint, Location, SensorFrame, SensorId, SimTime, VehicleId,
    VehicleSensorUpdate,
};
use nalgebra::{Matrix3, Vector3};
use tracing::{debug, trace};

const XYZ_BYTES: usize = 12;

/// Re-expresses point clouds in the host frame
#[derive(Debug, Clone)]
pub struct SensorRelay {
    /// (x, y, z) -> (x, z, -y)
    axis_swap: Matrix3<f64>,
}

impl SensorRelay {
    pub fn new() -> Self {
        Self {
            axis_swap: Matrix3::new(
                1.0, 0.0, 0.0, //
                0.0, 0.0, 1.0, //
                0.0, -1.0, 0.0,
            ),
        }
    }

    /// Build the host update for one frame
    ///
    /// `vehicle_for` resolves the sensor binding; frames from sensors that are
    /// no longer bound return `None`.
    pub fn relay<F>(
        &self,
        frame: &SensorFrame,
        vehicle_for: F,
        timestamp: SimTime,
    ) -> Option<VehicleSensorUpdate>
    where
        F: Fn(&SensorId) -> Option<VehicleId>,
    {
        let Some(vehicle_id) = vehicle_for(&frame.sensor_id) else {
            debug!(sensor_id = %frame.sensor_id, "dropping frame from unbound sensor");
            return None;
        };

        let points = self.convert_points(frame);
        trace!(
            sensor_id = %frame.sensor_id,
            vehicle_id = %vehicle_id,
            points = points.len(),
            "lidar frame relayed"
        );

        Some(VehicleSensorUpdate {
            vehicle_id,
            lidar: LidarFrame {
                rotation: identity_rows(),
                reference: frame.location,
                points,
                timestamp,
                min_range: frame.min_range,
                max_range: frame.max_range,
            },
        })
    }

    fn convert_points(&self, frame: &SensorFrame) -> Vec<LidarPoint> {
        let cloud = &frame.points;
        let stride = cloud.point_stride as usize;
        if stride < XYZ_BYTES {
            return Vec::new();
        }

        cloud
            .data
            .chunks_exact(stride)
            .take(cloud.num_points as usize)
            .map(|chunk| {
                let bits = pod_read_unaligned::<[u32; 3]>(&chunk[..XYZ_BYTES]);
                let [x, y, z] = bits.map(|b| f32::from_bits(u32::from_le(b)));
                let swapped =
                    self.axis_swap * Vector3::new(f64::from(x), f64::from(y), f64::from(z));
                LidarPoint {
                    position: Location::new(swapped.x, swapped.y, swapped.z),
                    hit: true,
                }
            })
            .collect()
    }
}

impl Default for SensorRelay {
    fn default() -> Self {
        Self::new()
    }
}

fn identity_rows() -> [[f64; 3]; 3] {
    let identity = Matrix3::<f64>::identity();
    let mut rows = [[0.0; 3]; 3];
    for (r, row) in rows.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            *cell = identity[(r, c)];
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use contracts::PointCloudData;

    fn frame(points: &[[f32; 4]]) -> SensorFrame {
        let data: Vec<u8> = points
            .iter()
            .flat_map(|p| p.iter().flat_map(|v| v.to_le_bytes()))
            .collect();
        SensorFrame {
            sensor_id: "1000".into(),
            location: Location::new(5.0, 6.0, 1.8),
            min_range: 0.5,
            max_range: 10.0,
            points: PointCloudData {
                num_points: points.len() as u32,
                point_stride: 16,
                data: Bytes::from(data),
            },
        }
    }

    #[test]
    fn test_axis_swap() {
        let relay = SensorRelay::new();
        let frame = frame(&[[1.0, 2.0, 3.0, 0.9], [-4.0, 0.5, 0.0, 0.1]]);
        let update = relay
            .relay(&frame, |_| Some(VehicleId::from("veh_0")), 2_000)
            .unwrap();

        assert_eq!(update.vehicle_id, "veh_0");
        let points: Vec<Location> = update.lidar.points.iter().map(|p| p.position).collect();
        assert_eq!(
            points,
            vec![Location::new(1.0, 3.0, -2.0), Location::new(-4.0, 0.0, -0.5)]
        );
        assert!(update.lidar.points.iter().all(|p| p.hit));
    }

    #[test]
    fn test_points_decoded_little_endian() {
        // 1.0, 2.0, -1.0 as little-endian f32
        let data = vec![
            0x00, 0x00, 0x80, 0x3f, //
            0x00, 0x00, 0x00, 0x40, //
            0x00, 0x00, 0x80, 0xbf,
        ];
        let mut frame = frame(&[]);
        frame.points = PointCloudData {
            num_points: 1,
            point_stride: 12,
            data: Bytes::from(data),
        };
        let update = SensorRelay::new()
            .relay(&frame, |_| Some(VehicleId::from("v")), 0)
            .unwrap();
        assert_eq!(update.lidar.points[0].position, Location::new(1.0, -1.0, -2.0));
    }

    #[test]
    fn test_frame_metadata() {
        let relay = SensorRelay::default();
        let frame = frame(&[[0.0, 0.0, 0.0, 0.0]]);
        let update = relay
            .relay(&frame, |_| Some(VehicleId::from("veh_0")), 42)
            .unwrap();
        let lidar = update.lidar;
        assert_eq!(lidar.timestamp, 42);
        assert_eq!(lidar.reference, Location::new(5.0, 6.0, 1.8));
        assert_eq!(lidar.min_range, 0.5);
        assert_eq!(lidar.max_range, 10.0);
        assert_eq!(
            lidar.rotation,
            [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
        );
    }

    #[test]
    fn test_unbound_sensor_dropped() {
        let relay = SensorRelay::new();
        let frame = frame(&[[1.0, 1.0, 1.0, 1.0]]);
        assert!(relay.relay(&frame, |_| None, 0).is_none());
    }

    #[test]
    fn test_empty_cloud() {
        let relay = SensorRelay::new();
        let update = relay
            .relay(&frame(&[]), |_| Some(VehicleId::from("v")), 0)
            .unwrap();
        assert!(update.lidar.points.is_empty());
    }
}
