use crate::mod_params::*;
use crate::mod_traits::{PhysicalLayer, RadioKind};
use crate::{DelayNs, Radio};

impl<RK, DLY> PhysicalLayer for Radio<RK, DLY>
where
    RK: RadioKind,
    DLY: DelayNs,
{
    async fn transmit(&mut self, data: &[u8]) -> Result<(), RadioError> {
        Radio::transmit(self, data).await
    }

    async fn receive(&mut self, buffer: &mut [u8], timeout: RxTimeout) -> Result<usize, RadioError> {
        Radio::receive(self, buffer, timeout).await
    }

    async fn start_transmit(&mut self, data: &[u8]) -> Result<(), RadioError> {
        Radio::start_transmit(self, data).await
    }

    async fn finish_transmit(&mut self) -> Result<(), RadioError> {
        Radio::finish_transmit(self).await
    }

    async fn start_receive(&mut self, config: RxConfig) -> Result<(), RadioError> {
        Radio::start_receive(self, config).await
    }

    async fn finish_receive(&mut self, buffer: &mut [u8]) -> Result<usize, RadioError> {
        Radio::finish_receive(self, buffer).await
    }

    async fn scan_channel(&mut self) -> Result<ChannelScanResult, RadioError> {
        Radio::scan_channel(self).await
    }

    async fn start_channel_scan(&mut self) -> Result<(), RadioError> {
        Radio::start_channel_scan(self).await
    }

    async fn get_channel_scan_result(&mut self) -> Result<ChannelScanResult, RadioError> {
        Radio::get_channel_scan_result(self).await
    }

    async fn set_frequency(&mut self, frequency_in_hz: u32) -> Result<(), RadioError> {
        Radio::set_frequency(self, frequency_in_hz).await
    }

    async fn set_bandwidth(&mut self, bandwidth: Bandwidth) -> Result<(), RadioError> {
        Radio::set_bandwidth(self, bandwidth).await
    }

    async fn set_spreading_factor(&mut self, spreading_factor: SpreadingFactor) -> Result<(), RadioError> {
        Radio::set_spreading_factor(self, spreading_factor).await
    }

    async fn set_coding_rate(&mut self, coding_rate: CodingRate) -> Result<(), RadioError> {
        Radio::set_coding_rate(self, coding_rate).await
    }

    async fn set_output_power(&mut self, output_power: i8) -> Result<(), RadioError> {
        Radio::set_output_power(self, output_power).await
    }

    async fn set_preamble_length(&mut self, preamble_length: u16) -> Result<(), RadioError> {
        Radio::set_preamble_length(self, preamble_length).await
    }

    fn get_time_on_air(&self, len: usize) -> u32 {
        self.time_on_air(len)
    }

    async fn get_rssi(&mut self) -> Result<i16, RadioError> {
        Radio::get_rssi(self).await
    }

    async fn get_snr(&mut self) -> Result<i16, RadioError> {
        Radio::get_snr(self).await
    }

    async fn stage(&mut self, config: ModeConfig<'_>) -> Result<(), RadioError> {
        Radio::stage(self, config).await
    }

    async fn launch(&mut self) -> Result<(), RadioError> {
        Radio::launch(self).await
    }
}
