use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use embedded_hal::spi::Operation;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::spi::SpiDevice;

use crate::mod_params::{RadioError, RfSwitchState};
use crate::mod_traits::InterfaceVariant;

// Virtual time spent per poll loop iteration
const TICK_US: u32 = 100;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Ops {
    Transfer(Vec<u8>),
    Reset(bool),
    RfSwitch(RfSwitchState),
}

#[derive(Default)]
struct State {
    ops: Vec<Ops>,
    responses: HashMap<u8, Vec<u8>>,
    fill: u8,
    busy: bool,
    clock_us: u32,
    irq_after_polls: Option<u32>,
    irq_polls: u32,
    yields: u32,
    logged: usize,
    delayed_ns: u64,
}

/// Shared state behind the mock bus, board glue and delay handed to a driver
#[derive(Clone, Default)]
pub struct Bench(Rc<RefCell<State>>);

impl Bench {
    /// Every byte the chip clocks back defaults to `fill`
    pub fn new(fill: u8) -> Self {
        let bench = Self::default();
        bench.0.borrow_mut().fill = fill;
        bench
    }

    pub fn spi(&self) -> TestSpi {
        TestSpi(self.clone())
    }

    pub fn iv(&self) -> TestVariant {
        TestVariant(self.clone())
    }

    pub fn delay(&self) -> Delayer {
        Delayer(self.clone())
    }

    /// Bytes clocked back for frames starting with `first`; bytes past the end read as fill
    pub fn respond(&self, first: u8, bytes: &[u8]) {
        self.0.borrow_mut().responses.insert(first, bytes.to_vec());
    }

    pub fn hold_busy(&self, busy: bool) {
        self.0.borrow_mut().busy = busy;
    }

    /// Completion line asserts on the given poll and stays asserted; `None` keeps it low
    pub fn raise_irq_after(&self, polls: Option<u32>) {
        let mut state = self.0.borrow_mut();
        state.irq_after_polls = polls;
        state.irq_polls = 0;
    }

    pub fn ops(&self) -> Vec<Ops> {
        self.0.borrow().ops.clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().ops.clear();
    }

    /// Bus frames in order
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.0
            .borrow()
            .ops
            .iter()
            .filter_map(|op| match op {
                Ops::Transfer(frame) => Some(frame.clone()),
                _ => None,
            })
            .collect()
    }

    /// Frames starting with `first`
    pub fn frames_starting(&self, first: u8) -> Vec<Vec<u8>> {
        self.frames().into_iter().filter(|frame| frame.first() == Some(&first)).collect()
    }

    pub fn rf_switch(&self) -> Vec<RfSwitchState> {
        self.0
            .borrow()
            .ops
            .iter()
            .filter_map(|op| match op {
                Ops::RfSwitch(state) => Some(*state),
                _ => None,
            })
            .collect()
    }

    /// Number of times the reset line was released
    pub fn resets(&self) -> usize {
        self.0.borrow().ops.iter().filter(|op| **op == Ops::Reset(false)).count()
    }

    pub fn logged_transactions(&self) -> usize {
        self.0.borrow().logged
    }

    pub fn yields(&self) -> u32 {
        self.0.borrow().yields
    }

    pub fn delayed_ms(&self) -> u64 {
        self.0.borrow().delayed_ns / 1_000_000
    }
}

pub struct TestSpi(Bench);

impl embedded_hal::spi::ErrorType for TestSpi {
    type Error = core::convert::Infallible;
}

impl TestSpi {
    fn exchange(&mut self, write: &[u8], read: &mut [u8]) {
        let mut state = self.0 .0.borrow_mut();
        let response = write
            .first()
            .and_then(|first| state.responses.get(first))
            .cloned()
            .unwrap_or_default();
        for (i, byte) in read.iter_mut().enumerate() {
            *byte = response.get(i).copied().unwrap_or(state.fill);
        }
        state.ops.push(Ops::Transfer(write.to_vec()));
    }
}

impl SpiDevice<u8> for TestSpi {
    async fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        for operation in operations.iter_mut() {
            match operation {
                Operation::Transfer(read, write) => self.exchange(write, read),
                Operation::TransferInPlace(buf) => {
                    let write = buf.to_vec();
                    self.exchange(&write, buf);
                }
                Operation::Write(write) => self.exchange(write, &mut []),
                Operation::Read(read) => self.exchange(&[], read),
                Operation::DelayNs(_) => {}
            }
        }
        Ok(())
    }
}

pub struct TestVariant(Bench);

impl InterfaceVariant for TestVariant {
    fn set_reset(&mut self, asserted: bool) -> Result<(), RadioError> {
        self.0 .0.borrow_mut().ops.push(Ops::Reset(asserted));
        Ok(())
    }

    fn busy_asserted(&mut self) -> Result<bool, RadioError> {
        Ok(self.0 .0.borrow().busy)
    }

    fn irq_asserted(&mut self) -> Result<bool, RadioError> {
        let mut state = self.0 .0.borrow_mut();
        state.irq_polls += 1;
        Ok(matches!(state.irq_after_polls, Some(after) if state.irq_polls >= after))
    }

    fn now_micros(&mut self) -> u32 {
        self.0 .0.borrow().clock_us
    }

    async fn yield_now(&mut self) {
        let mut state = self.0 .0.borrow_mut();
        state.yields += 1;
        state.clock_us = state.clock_us.wrapping_add(TICK_US);
    }

    async fn set_rf_switch(&mut self, state: RfSwitchState) -> Result<(), RadioError> {
        self.0 .0.borrow_mut().ops.push(Ops::RfSwitch(state));
        Ok(())
    }

    fn on_transaction(&mut self, _out: &[u8], _in: &[u8]) {
        self.0 .0.borrow_mut().logged += 1;
    }
}

pub struct Delayer(Bench);

impl DelayNs for Delayer {
    async fn delay_ns(&mut self, ns: u32) {
        let mut state = self.0 .0.borrow_mut();
        state.delayed_ns += ns as u64;
        state.clock_us = state.clock_us.wrapping_add(ns / 1000);
    }
}

#[test]
fn responses_are_keyed_by_first_byte() {
    let bench = Bench::new(0xEE);
    bench.respond(0x12, &[0x01, 0x02]);
    let mut spi = bench.spi();
    let mut read = [0u8; 3];
    spi.exchange(&[0x12, 0x00, 0x00], &mut read);
    assert_eq!(read, [0x01, 0x02, 0xEE]);
    assert_eq!(bench.ops(), vec![Ops::Transfer(vec![0x12, 0x00, 0x00])]);
}
