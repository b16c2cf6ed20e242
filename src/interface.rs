use embedded_hal_async::spi::SpiDevice;

use crate::mod_params::RadioError::{self, SPI};
use crate::mod_traits::InterfaceVariant;

// Command (2) + address (4) + status (1) + a full 256 byte buffer
const MAX_FRAME_LEN: usize = 263;

/// Outcome of a transaction as reported by the chip's status byte
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Command accepted
    Success,
    /// Opcode or parameters rejected
    InvalidCommand,
    /// Command accepted but could not be executed
    CommandFailed,
    /// Command did not complete in time
    Timeout,
    /// Nothing is driving the bus
    DeviceNotFound,
}

impl TransactionStatus {
    fn into_result(self) -> Result<(), RadioError> {
        match self {
            TransactionStatus::Success => Ok(()),
            TransactionStatus::InvalidCommand => Err(RadioError::InvalidCommand),
            TransactionStatus::CommandFailed => Err(RadioError::CommandFailed),
            TransactionStatus::Timeout => Err(RadioError::CommandTimeout),
            TransactionStatus::DeviceNotFound => Err(RadioError::NoResponse),
        }
    }
}

/// Layout of the register transactions of one chip family.
///
/// Register chips send an address with the direction folded into its top byte. Command
/// chips ("stream" mode) send a command, an optional address, then exchange a status byte
/// ahead of the data.
#[derive(Debug, Clone, Copy)]
pub struct TransactionConfig {
    /// Command width in bits: 0, 8 or 16
    pub command_width: u8,
    /// Address width in bits: 0, 8, 16, 24 or 32
    pub address_width: u8,
    /// Status width in bits: 0 or 8
    pub status_width: u8,
    /// Status is exchanged after the command instead of never
    pub stream: bool,
    /// Index of the response byte carrying the status
    pub status_pos: usize,
    /// Command (stream) or address flag (register) for reads
    pub read_command: u16,
    /// Command (stream) or address flag (register) for writes
    pub write_command: u16,
    /// Byte clocked out while reading
    pub nop: u8,
    /// How long BUSY may stay asserted around a transfer; `None` when there is no BUSY line
    pub busy_timeout_us: Option<u32>,
    /// Decoder for the status byte
    pub parse_status: Option<fn(u8) -> TransactionStatus>,
}

impl TransactionConfig {
    fn command_len(&self) -> usize {
        (self.command_width / 8) as usize
    }

    fn address_len(&self) -> usize {
        (self.address_width / 8) as usize
    }

    fn status_len(&self) -> usize {
        (self.status_width / 8) as usize
    }
}

enum Payload<'a> {
    Write(&'a [u8]),
    Read(&'a mut [u8]),
}

impl Payload<'_> {
    fn len(&self) -> usize {
        match self {
            Payload::Write(data) => data.len(),
            Payload::Read(data) => data.len(),
        }
    }
}

/// The read/write interface between an embedded framework/MCU combination and a radio chip
pub struct SpiInterface<SPI, IV> {
    pub(crate) spi: SPI,
    pub(crate) iv: IV,
    config: TransactionConfig,
}

impl<SPI, IV> SpiInterface<SPI, IV>
where
    SPI: SpiDevice<u8>,
    IV: InterfaceVariant,
{
    /// Wrap a bus and board glue with the given transaction layout
    pub fn new(spi: SPI, iv: IV, config: TransactionConfig) -> Self {
        Self { spi, iv, config }
    }

    /// Transaction layout in use
    pub fn config(&self) -> &TransactionConfig {
        &self.config
    }

    /// Board glue
    pub fn iv(&mut self) -> &mut IV {
        &mut self.iv
    }

    /// Read `data.len()` bytes starting at register `address`
    pub async fn read(&mut self, address: u32, data: &mut [u8]) -> Result<(), RadioError> {
        let (addr, len) = self.address_bytes(address);
        let command = self.config.read_command;
        self.transfer(command, &addr[..len], Payload::Read(data), false).await
    }

    /// Write `data` starting at register `address`
    pub async fn write(&mut self, address: u32, data: &[u8]) -> Result<(), RadioError> {
        let (addr, len) = self.address_bytes(address);
        let command = self.config.write_command;
        self.transfer(command, &addr[..len], Payload::Write(data), false).await
    }

    /// Issue `opcode` with `params`
    pub async fn command_write(&mut self, opcode: u16, params: &[u8]) -> Result<(), RadioError> {
        self.command(opcode, params, Payload::Write(&[]), false).await
    }

    /// Issue `opcode` with `params` and read `reply.len()` response bytes
    pub async fn command_read(&mut self, opcode: u16, params: &[u8], reply: &mut [u8]) -> Result<(), RadioError> {
        self.command(opcode, params, Payload::Read(reply), false).await
    }

    /// Issue a command after which the chip stops answering, so BUSY is not awaited
    pub async fn command_sleep(&mut self, opcode: u16, params: &[u8]) -> Result<(), RadioError> {
        self.command(opcode, params, Payload::Write(&[]), true).await
    }

    /// Issue `opcode` with `params` followed by a bulk `data` write
    pub async fn command_write_data(&mut self, opcode: u16, params: &[u8], data: &[u8]) -> Result<(), RadioError> {
        self.command(opcode, params, Payload::Write(data), false).await
    }

    /// Wait until the chip deasserts BUSY
    pub async fn wait_on_busy(&mut self) -> Result<(), RadioError> {
        let Some(timeout_us) = self.config.busy_timeout_us else {
            return Ok(());
        };
        let start = self.iv.now_micros();
        while self.iv.busy_asserted()? {
            if self.iv.now_micros().wrapping_sub(start) >= timeout_us {
                warn!("busy line stuck for {} us", timeout_us);
                return Err(RadioError::Busy);
            }
            self.iv.yield_now().await;
        }
        Ok(())
    }

    async fn command(
        &mut self,
        opcode: u16,
        params: &[u8],
        payload: Payload<'_>,
        is_sleep_command: bool,
    ) -> Result<(), RadioError> {
        if !self.config.stream {
            return Err(RadioError::Unsupported);
        }
        self.transfer(opcode, params, payload, is_sleep_command).await
    }

    fn address_bytes(&self, address: u32) -> ([u8; 4], usize) {
        let len = self.config.address_len();
        let mut bytes = [0u8; 4];
        for (i, byte) in bytes[..len].iter_mut().enumerate() {
            *byte = (address >> (8 * (len - 1 - i))) as u8;
        }
        (bytes, len)
    }

    async fn transfer(
        &mut self,
        command: u16,
        header: &[u8],
        mut payload: Payload<'_>,
        is_sleep_command: bool,
    ) -> Result<(), RadioError> {
        let config = self.config;
        let mut out = [0u8; MAX_FRAME_LEN];
        let mut n = 0;

        if config.stream {
            let command_len = config.command_len();
            for i in 0..command_len {
                out[n] = (command >> (8 * (command_len - 1 - i))) as u8;
                n += 1;
            }
            if n + header.len() > MAX_FRAME_LEN {
                return Err(RadioError::FrameTooLong(n + header.len()));
            }
            out[n..n + header.len()].copy_from_slice(header);
            n += header.len();
            if let Payload::Read(_) = payload {
                for _ in 0..config.status_len() {
                    out[n] = config.nop;
                    n += 1;
                }
            }
        } else {
            out[..header.len()].copy_from_slice(header);
            if let Some(first) = out.first_mut() {
                *first |= command as u8;
            }
            n = header.len();
        }

        let header_len = n;
        let total = header_len + payload.len();
        if total > MAX_FRAME_LEN {
            return Err(RadioError::FrameTooLong(total));
        }
        match &payload {
            Payload::Write(data) => out[header_len..total].copy_from_slice(data),
            Payload::Read(_) => out[header_len..total].fill(config.nop),
        }

        self.wait_on_busy().await?;
        let mut input = [0u8; MAX_FRAME_LEN];
        self.spi
            .transfer(&mut input[..total], &out[..total])
            .await
            .map_err(|_| SPI)?;
        trace!("spi out: {=[u8]:02x} in: {=[u8]:02x}", &out[..total], &input[..total]);
        self.iv.on_transaction(&out[..total], &input[..total]);

        if !is_sleep_command {
            self.wait_on_busy().await?;
        }

        if let Payload::Read(data) = &mut payload {
            data.copy_from_slice(&input[header_len..total]);
        }

        match config.parse_status {
            Some(parse) if config.stream && config.status_len() > 0 && total > config.status_pos => {
                parse(input[config.status_pos]).into_result()
            }
            _ => Ok(()),
        }
    }
}
