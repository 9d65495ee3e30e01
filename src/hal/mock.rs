//! Recording [`TimerHal`] for tests.

use std::vec::Vec;

use super::{Edge, TimerHal};
use crate::board::{ChannelDescriptor, TimerId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Call {
    Period { port: usize, period: u32 },
    Compare { port: usize, compare: u32 },
    Capture { port: usize, edge: Edge },
    Interrupt { port: usize },
    MainOutput { timer: TimerId },
}

#[derive(Debug, Default)]
pub struct MockTimers {
    pub calls: Vec<Call>,
}

impl MockTimers {
    pub fn compares(&self, port: usize) -> Vec<u32> {
        self.calls
            .iter()
            .filter_map(|call| match *call {
                Call::Compare { port: p, compare } if p == port => Some(compare),
                _ => None,
            })
            .collect()
    }

    pub fn last_edge(&self, port: usize) -> Option<Edge> {
        self.calls.iter().rev().find_map(|call| match *call {
            Call::Capture { port: p, edge } if p == port => Some(edge),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl TimerHal for MockTimers {
    fn set_period(&mut self, port: usize, _hw: &ChannelDescriptor, period: u32) {
        self.calls.push(Call::Period { port, period });
    }

    fn set_compare(&mut self, port: usize, _hw: &ChannelDescriptor, compare: u32) {
        self.calls.push(Call::Compare { port, compare });
    }

    fn set_capture_edge(&mut self, port: usize, _hw: &ChannelDescriptor, edge: Edge) {
        self.calls.push(Call::Capture { port, edge });
    }

    fn enable_interrupt(&mut self, port: usize, _hw: &ChannelDescriptor) {
        self.calls.push(Call::Interrupt { port });
    }

    fn enable_main_output(&mut self, hw: &ChannelDescriptor) {
        self.calls.push(Call::MainOutput { timer: hw.timer });
    }
}
