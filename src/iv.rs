use embedded_hal::digital::{InputPin, OutputPin};

use crate::mod_params::RadioError::*;
use crate::mod_params::{RadioError, RfSwitchState};
use crate::mod_traits::InterfaceVariant;

/// Base for the InterfaceVariant implementation for a generic board: a reset line, a
/// completion interrupt line, an optional BUSY line and optional antenna switch controls.
///
/// `clock` returns a monotonic microsecond count, for instance from the board's timer driver.
pub struct GenericInterfaceVariant<CTRL, INPUT, CLK> {
    reset: CTRL,
    irq: INPUT,
    busy: Option<INPUT>,
    rf_switch_rx: Option<CTRL>,
    rf_switch_tx: Option<CTRL>,
    clock: CLK,
}

impl<CTRL, INPUT, CLK> GenericInterfaceVariant<CTRL, INPUT, CLK>
where
    CTRL: OutputPin,
    INPUT: InputPin,
    CLK: FnMut() -> u32,
{
    /// Create an InterfaceVariant instance
    pub fn new(
        reset: CTRL,
        irq: INPUT,
        busy: Option<INPUT>,
        rf_switch_rx: Option<CTRL>,
        rf_switch_tx: Option<CTRL>,
        clock: CLK,
    ) -> Result<Self, RadioError> {
        Ok(Self {
            reset,
            irq,
            busy,
            rf_switch_rx,
            rf_switch_tx,
            clock,
        })
    }

    fn drive_switch(pin: &mut Option<CTRL>, high: bool) -> Result<(), RadioError> {
        match pin {
            Some(pin) if high => pin.set_high().map_err(|_| RfSwitch),
            Some(pin) => pin.set_low().map_err(|_| RfSwitch),
            None => Ok(()),
        }
    }
}

impl<CTRL, INPUT, CLK> InterfaceVariant for GenericInterfaceVariant<CTRL, INPUT, CLK>
where
    CTRL: OutputPin,
    INPUT: InputPin,
    CLK: FnMut() -> u32,
{
    fn set_reset(&mut self, asserted: bool) -> Result<(), RadioError> {
        // Reset is active low
        if asserted {
            self.reset.set_low().map_err(|_| Reset)
        } else {
            self.reset.set_high().map_err(|_| Reset)
        }
    }

    fn busy_asserted(&mut self) -> Result<bool, RadioError> {
        match &mut self.busy {
            Some(busy) => busy.is_high().map_err(|_| Busy),
            None => Ok(false),
        }
    }

    fn irq_asserted(&mut self) -> Result<bool, RadioError> {
        self.irq.is_high().map_err(|_| Irq)
    }

    fn now_micros(&mut self) -> u32 {
        (self.clock)()
    }

    async fn set_rf_switch(&mut self, state: RfSwitchState) -> Result<(), RadioError> {
        // Release the active side first so both paths are never enabled together
        match state {
            RfSwitchState::Idle => {
                Self::drive_switch(&mut self.rf_switch_rx, false)?;
                Self::drive_switch(&mut self.rf_switch_tx, false)
            }
            RfSwitchState::Rx => {
                Self::drive_switch(&mut self.rf_switch_tx, false)?;
                Self::drive_switch(&mut self.rf_switch_rx, true)
            }
            RfSwitchState::Tx => {
                Self::drive_switch(&mut self.rf_switch_rx, false)?;
                Self::drive_switch(&mut self.rf_switch_tx, true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

    use super::*;

    type Log = Rc<RefCell<Vec<(&'static str, bool)>>>;

    struct Pin {
        name: &'static str,
        log: Log,
    }

    impl ErrorType for Pin {
        type Error = core::convert::Infallible;
    }

    impl OutputPin for Pin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.log.borrow_mut().push((self.name, false));
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.log.borrow_mut().push((self.name, true));
            Ok(())
        }
    }

    impl InputPin for Pin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.name == "busy")
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(self.name != "busy")
        }
    }

    fn pin(name: &'static str, log: &Log) -> Pin {
        Pin { name, log: log.clone() }
    }

    #[tokio::test]
    async fn rf_switch_releases_the_other_path_first() {
        let log = Log::default();
        let mut iv = GenericInterfaceVariant::new(
            pin("reset", &log),
            pin("irq", &log),
            None,
            Some(pin("rx", &log)),
            Some(pin("tx", &log)),
            || 0,
        )
        .unwrap();

        iv.set_rf_switch(RfSwitchState::Tx).await.unwrap();
        iv.set_rf_switch(RfSwitchState::Rx).await.unwrap();
        iv.set_rf_switch(RfSwitchState::Idle).await.unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                ("rx", false),
                ("tx", true),
                ("tx", false),
                ("rx", true),
                ("rx", false),
                ("tx", false)
            ]
        );
    }

    #[test]
    fn reset_is_active_low_and_busy_is_optional() {
        let log = Log::default();
        let mut ticks = 0;
        let mut iv = GenericInterfaceVariant::new(pin("reset", &log), pin("irq", &log), None, None, None, || {
            ticks += 250;
            ticks
        })
        .unwrap();

        iv.set_reset(true).unwrap();
        iv.set_reset(false).unwrap();

        assert_eq!(*log.borrow(), vec![("reset", false), ("reset", true)]);
        assert_eq!(iv.busy_asserted(), Ok(false));
        assert_eq!(iv.irq_asserted(), Ok(false));
        assert_eq!(iv.now_micros(), 250);
        assert_eq!(iv.now_micros(), 500);

        let mut iv = GenericInterfaceVariant::new(
            pin("reset", &log),
            pin("irq", &log),
            Some(pin("busy", &log)),
            None,
            None,
            || 0,
        )
        .unwrap();
        assert_eq!(iv.busy_asserted(), Ok(true));
    }
}
