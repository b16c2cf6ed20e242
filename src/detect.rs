use embedded_hal_async::delay::DelayNs;

use crate::mod_params::RadioError;
use crate::mod_traits::{InterfaceVariant, RadioKind};

/// Identity reads attempted before giving up
pub const ATTEMPTS: usize = 10;
const RETRY_DELAY_MS: u32 = 10;

/// Reset the chip and check that it identifies itself, retrying a bounded number of times.
///
/// A failed bus transaction during an attempt counts as a failed attempt. Once every attempt
/// has failed the chip is reported as [`RadioError::DeviceNotFound`].
pub async fn find_chip<RK: RadioKind>(radio_kind: &mut RK, delay: &mut impl DelayNs) -> Result<(), RadioError> {
    let profile = radio_kind.profile();
    for attempt in 1..=ATTEMPTS {
        match identify(radio_kind, delay).await {
            Ok(true) => {
                info!("{} found after {} attempt(s)", profile.name, attempt);
                return Ok(());
            }
            Ok(false) => {}
            Err(err) => debug!("identification attempt {} failed: {:?}", attempt, err),
        }
        delay.delay_ms(RETRY_DELAY_MS).await;
    }
    warn!("no {} answered after {} attempts", profile.name, ATTEMPTS);
    Err(RadioError::DeviceNotFound)
}

async fn identify<RK: RadioKind>(radio_kind: &mut RK, delay: &mut impl DelayNs) -> Result<bool, RadioError> {
    let profile = radio_kind.profile();
    let reset = profile.reset;

    delay.delay_ms(reset.before_ms).await;
    radio_kind.interface().iv().set_reset(true)?;
    delay.delay_ms(reset.asserted_ms).await;
    radio_kind.interface().iv().set_reset(false)?;
    delay.delay_ms(reset.settle_ms).await;
    radio_kind.wait_ready(delay).await?;

    let identity = profile.identity;
    let mut read = [0u8; 16];
    let len = identity.len.min(read.len());
    radio_kind.interface().read(identity.address, &mut read[..len]).await?;
    debug!("identity read: {=[u8]:02x}", &read[..len]);
    Ok(identity.matches(&read[..len]))
}
