//! Tick-major sample and prediction buffers.
//!
//! Datasets on disk are channel-major (one row per channel); the wire and the
//! drivers work tick by tick. These types hold one contiguous tick-major
//! buffer and convert at the edges.

use crate::error::{Result, SessionError};

/// Integer samples to stream, one row per tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleMatrix {
    channel_count: usize,
    data: Vec<i32>,
}

impl SampleMatrix {
    /// Wrap a tick-major buffer of `channel_count`-wide rows.
    pub fn new(channel_count: usize, data: Vec<i32>) -> Result<Self> {
        if channel_count == 0 {
            return Err(SessionError::InvalidInput(
                "sample matrix needs at least one channel".to_string(),
            ));
        }
        if data.len() % channel_count != 0 {
            return Err(SessionError::InvalidInput(format!(
                "{} values do not divide into rows of {channel_count}",
                data.len()
            )));
        }
        Ok(Self {
            channel_count,
            data,
        })
    }

    /// Build from channel-major rows, as stored in dataset files.
    ///
    /// Every row must have the same, non-zero length.
    pub fn from_channel_major(channels: &[Vec<i32>]) -> Result<Self> {
        let channel_count = channels.len();
        let ticks = channels.first().map_or(0, Vec::len);
        if channel_count == 0 || ticks == 0 {
            return Err(SessionError::InvalidInput("dataset is empty".to_string()));
        }
        if let Some((index, row)) = channels
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != ticks)
        {
            return Err(SessionError::InvalidInput(format!(
                "channel {index} has {} ticks, channel 0 has {ticks}",
                row.len()
            )));
        }

        let mut data = Vec::with_capacity(channel_count * ticks);
        for tick in 0..ticks {
            data.extend(channels.iter().map(|row| row[tick]));
        }
        Ok(Self {
            channel_count,
            data,
        })
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn tick_count(&self) -> usize {
        self.data.len() / self.channel_count
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Samples for one tick.
    pub fn tick(&self, index: usize) -> Option<&[i32]> {
        self.data.chunks_exact(self.channel_count).nth(index)
    }

    /// Iterate ticks in order.
    pub fn ticks(&self) -> std::slice::ChunksExact<'_, i32> {
        self.data.chunks_exact(self.channel_count)
    }

    /// Channel-major copy, one row per channel.
    pub fn to_channel_major(&self) -> Vec<Vec<i32>> {
        transpose(&self.data, self.channel_count)
    }
}

/// Predictions collected over a run, one row per tick.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionMatrix {
    channel_count: usize,
    data: Vec<f64>,
}

impl PredictionMatrix {
    /// Empty matrix with room for `ticks` rows.
    pub fn with_capacity(channel_count: usize, ticks: usize) -> Self {
        Self {
            channel_count,
            data: Vec::with_capacity(channel_count * ticks),
        }
    }

    /// Append one tick.
    pub fn push(&mut self, prediction: &[f64]) -> Result<()> {
        if prediction.len() != self.channel_count {
            return Err(SessionError::InvalidInput(format!(
                "prediction has {} channels, matrix holds {}",
                prediction.len(),
                self.channel_count
            )));
        }
        self.data.extend_from_slice(prediction);
        Ok(())
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn tick_count(&self) -> usize {
        if self.channel_count == 0 {
            return 0;
        }
        self.data.len() / self.channel_count
    }

    pub fn tick(&self, index: usize) -> Option<&[f64]> {
        if self.channel_count == 0 {
            return None;
        }
        self.data.chunks_exact(self.channel_count).nth(index)
    }

    /// Tick-major values.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Channel-major copy, one row per channel.
    pub fn to_channel_major(&self) -> Vec<Vec<f64>> {
        transpose(&self.data, self.channel_count)
    }
}

fn transpose<T: Copy>(data: &[T], channel_count: usize) -> Vec<Vec<T>> {
    if channel_count == 0 {
        return Vec::new();
    }
    let ticks = data.len() / channel_count;
    (0..channel_count)
        .map(|channel| {
            (0..ticks)
                .map(|tick| data[tick * channel_count + channel])
                .collect()
        })
        .collect()
}
