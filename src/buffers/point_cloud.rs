use std::sync::{Arc, Mutex, MutexGuard};

use crate::models::Vector3;

/// Points accumulated between flushes. Appends and the flush-time swap take
/// the same lock, so a flush never observes half a frame.
///
/// The buffer starts closed. While closed, frames are dropped on the floor so
/// a sink that outlives its pipeline cannot grow it.
#[derive(Clone, Default)]
pub struct PointCloudBuffer {
    points: Arc<Mutex<Option<Vec<Vector3>>>>,
}

impl PointCloudBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Vec<Vector3>>> {
        match self.points.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Start accepting frames. No-op when already open.
    pub fn open(&self) {
        self.lock().get_or_insert_with(Vec::new);
    }

    /// Stop accepting frames and return whatever was never flushed.
    pub fn close(&self) -> Vec<Vector3> {
        self.lock().take().unwrap_or_default()
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    pub fn append(&self, points: &[Vector3]) {
        if points.is_empty() {
            return;
        }
        if let Some(buffered) = self.lock().as_mut() {
            buffered.extend_from_slice(points);
        }
    }

    /// Returns everything appended since the last take and leaves the buffer empty.
    pub fn take(&self) -> Vec<Vector3> {
        self.lock().as_mut().map(std::mem::take).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.lock().as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Producer handle the AR frame callback pushes into.
#[derive(Clone)]
pub struct PointCloudSink {
    buffer: PointCloudBuffer,
}

impl PointCloudSink {
    pub(crate) fn new(buffer: PointCloudBuffer) -> Self {
        Self { buffer }
    }

    /// Frame callback. Frames without point data, and frames arriving while
    /// the pipeline is stopped, are ignored.
    pub fn on_frame(&self, points: &[Vector3]) {
        self.buffer.append(points);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn p(i: usize) -> Vector3 {
        Vector3::new(i as f32, 0.0, 0.0)
    }

    #[test]
    fn take_returns_concatenation_in_arrival_order() {
        let buffer = PointCloudBuffer::new();
        buffer.open();
        let sink = PointCloudSink::new(buffer.clone());

        sink.on_frame(&[p(0), p(1), p(2)]);
        sink.on_frame(&[]);
        sink.on_frame(&[p(3), p(4)]);

        assert_eq!(buffer.take(), vec![p(0), p(1), p(2), p(3), p(4)]);
        assert!(buffer.is_empty());
        assert!(buffer.take().is_empty());
    }

    #[test]
    fn concurrent_appends_and_takes_lose_nothing() {
        let buffer = PointCloudBuffer::new();
        buffer.open();
        let frames_per_producer = 500;
        let frame_len = 4;

        let producers: Vec<_> = (0..4)
            .map(|_| {
                let sink = PointCloudSink::new(buffer.clone());
                thread::spawn(move || {
                    for i in 0..frames_per_producer {
                        let frame: Vec<_> = (0..frame_len).map(|j| p(i * frame_len + j)).collect();
                        sink.on_frame(&frame);
                    }
                })
            })
            .collect();

        let mut collected = Vec::new();
        while producers.iter().any(|h| !h.is_finished()) {
            let taken = buffer.take();
            // Every swap sees whole frames only.
            assert_eq!(taken.len() % frame_len, 0);
            collected.extend(taken);
        }
        for handle in producers {
            handle.join().unwrap();
        }
        collected.extend(buffer.take());

        assert_eq!(collected.len(), 4 * frames_per_producer * frame_len);
    }

    #[test]
    fn closed_buffer_drops_frames() {
        let buffer = PointCloudBuffer::new();
        let sink = PointCloudSink::new(buffer.clone());

        sink.on_frame(&[p(0)]);
        assert!(!buffer.is_open());
        assert!(buffer.is_empty());

        buffer.open();
        sink.on_frame(&[p(1), p(2)]);
        assert_eq!(buffer.close(), vec![p(1), p(2)]);

        for i in 0..1000 {
            sink.on_frame(&[Vector3::default(); 100]);
            assert_eq!(buffer.len(), 0, "frame {i} was buffered after close");
        }
        assert!(buffer.take().is_empty());
    }

    #[test]
    fn reopening_keeps_nothing_from_before_close() {
        let buffer = PointCloudBuffer::new();
        buffer.open();
        buffer.append(&[p(7)]);
        buffer.close();

        buffer.open();
        assert!(buffer.is_empty());
        buffer.append(&[p(8)]);
        buffer.open();
        assert_eq!(buffer.take(), vec![p(8)]);
    }
}
