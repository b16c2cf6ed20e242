use crate::mod_params::*;
use crate::sx126x::{Config, Sx126x, Sx1262};
use crate::test_util::*;
use crate::{PhysicalLayer, Radio};

type TestRadio = Radio<Sx126x<TestSpi, TestVariant, Sx1262>, Delayer>;

// Status byte of a chip in STDBY_RC with no command error
const STATUS: u8 = 0x22;

fn lora() -> ModulationConfig {
    ModulationConfig::LoRa(LoRaParams {
        spreading_factor: SpreadingFactor::_7,
        bandwidth: Bandwidth::_125KHz,
        coding_rate: CodingRate::_4_5,
        ldro: Ldro::On,
    })
}

fn radio_config() -> RadioConfig {
    RadioConfig {
        modulation: lora(),
        packet: PacketConfig::lora_default(SyncWord::LORA_PUBLIC),
        frequency_in_hz: 868_100_000,
        output_power: 14,
    }
}

fn sx1262(bench: &Bench) -> Sx126x<TestSpi, TestVariant, Sx1262> {
    Sx126x::new(
        bench.spi(),
        bench.iv(),
        Config {
            chip: Sx1262,
            tcxo_ctrl: None,
            use_dcdc: false,
            rx_boost: false,
        },
    )
}

// A chip answering the version register read
fn answering_bench() -> Bench {
    let bench = Bench::new(STATUS);
    let mut version = vec![STATUS; 4];
    version.extend_from_slice(b"SX1262 V2D 2D02\0");
    bench.respond(0x1D, &version);
    bench
}

async fn radio(bench: &Bench) -> TestRadio {
    let radio = Radio::new(sx1262(bench), bench.delay(), radio_config()).await.unwrap();
    bench.clear();
    radio
}

fn irq_status(bench: &Bench, flags: u16) {
    let [hi, lo] = flags.to_be_bytes();
    bench.respond(0x12, &[STATUS, STATUS, hi, lo]);
}

#[tokio::test]
async fn silent_chip_is_not_found_after_ten_resets() {
    let bench = Bench::new(STATUS);

    let result = Radio::new(sx1262(&bench), bench.delay(), radio_config()).await;

    assert_eq!(result.err(), Some(RadioError::DeviceNotFound));
    assert_eq!(bench.resets(), 10);
    // 10 + 20 + 10 ms reset sequence and a 10 ms pause per attempt
    assert_eq!(bench.delayed_ms(), 500);
}

#[tokio::test]
async fn bus_errors_count_as_failed_attempts() {
    // Nothing drives MISO, so every status byte reads as zero
    let bench = Bench::new(0x00);

    let result = Radio::new(sx1262(&bench), bench.delay(), radio_config()).await;

    assert_eq!(result.err(), Some(RadioError::DeviceNotFound));
    assert_eq!(bench.resets(), 10);
}

#[tokio::test]
async fn init_identifies_and_configures_the_chip() {
    let bench = answering_bench();
    let radio = Radio::new(sx1262(&bench), bench.delay(), radio_config()).await.unwrap();

    assert_eq!(bench.resets(), 1);
    assert_eq!(radio.mode(), RadioMode::Standby(StandbyClock::Rc));
    assert_eq!(bench.frames_starting(0x8A), vec![vec![0x8A, 0x01]]);
    assert_eq!(bench.frames_starting(0x8B), vec![vec![0x8B, 0x07, 0x04, 0x01, 0x01]]);
    // Public sync word 0x34
    assert!(bench.frames().contains(&vec![0x0D, 0x07, 0x40, 0x34, 0x44]));
    assert_eq!(bench.frames_starting(0x98), vec![vec![0x98, 0xD7, 0xDB]]);
    assert_eq!(bench.frames_starting(0x86), vec![vec![0x86, 0x36, 0x41, 0x99, 0x9A]]);
    assert_eq!(bench.frames_starting(0x8E), vec![vec![0x8E, 22, 0x02]]);
}

#[tokio::test]
async fn staging_programs_everything_but_the_go_command() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;

    radio.stage(ModeConfig::Transmit(&[0x01, 0x02, 0x03])).await.unwrap();

    let frames = bench.frames();
    assert_eq!(frames.first(), Some(&vec![0x80, 0x00]));
    assert!(frames.contains(&vec![0x8C, 0x00, 0x08, 0x00, 0x03, 0x01, 0x00]));
    // TxDone and Timeout routed to DIO1
    assert!(frames.contains(&vec![0x08, 0x02, 0x01, 0x02, 0x01, 0x00, 0x00, 0x00, 0x00]));
    assert!(frames.contains(&vec![0x02, 0x03, 0xFF]));
    assert_eq!(frames.last(), Some(&vec![0x0E, 0x00, 0x01, 0x02, 0x03]));
    assert!(bench.frames_starting(0x83).is_empty());
    assert_eq!(radio.mode(), RadioMode::Standby(StandbyClock::Rc));

    bench.clear();
    radio.launch().await.unwrap();
    assert_eq!(bench.frames(), vec![vec![0x83, 0x00, 0x00, 0x00]]);
    assert_eq!(bench.rf_switch(), vec![RfSwitchState::Tx]);
    assert_eq!(radio.mode(), RadioMode::Transmit);
}

#[tokio::test]
async fn staging_twice_writes_identical_frames() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;

    let mut runs = Vec::new();
    for _ in 0..2 {
        bench.clear();
        radio.stage(ModeConfig::Transmit(&[0xAA; 12])).await.unwrap();
        radio.launch().await.unwrap();
        runs.push(bench.frames());
    }

    assert_eq!(runs[0], runs[1]);
}

#[tokio::test]
async fn launch_with_nothing_staged_is_unsupported() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;

    let err = radio.launch().await.unwrap_err();

    assert_eq!(err, RadioError::NothingStaged);
    assert_eq!(err.kind(), ErrorKind::Unsupported);
    assert!(bench.ops().is_empty());
    assert_eq!(radio.mode(), RadioMode::Standby(StandbyClock::Rc));

    radio.stage(ModeConfig::ChannelScan).await.unwrap();
    radio.launch().await.unwrap();
    assert_eq!(radio.launch().await, Err(RadioError::NothingStaged));
}

#[tokio::test]
async fn transmit_waits_for_tx_done() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;
    irq_status(&bench, 0x0001);
    bench.raise_irq_after(Some(5));

    radio.transmit(&[0x10, 0x20, 0x30]).await.unwrap();

    assert_eq!(radio.mode(), RadioMode::Standby(StandbyClock::Rc));
    assert_eq!(
        bench.rf_switch(),
        vec![RfSwitchState::Idle, RfSwitchState::Tx, RfSwitchState::Idle]
    );
    assert_eq!(bench.frames().last(), Some(&vec![0x02, 0x00, 0x01]));
    assert_eq!(bench.yields(), 4);
    // 24 bits in 400 us
    assert_eq!(radio.measured_data_rate(), Some(60_000));
}

#[tokio::test]
async fn transmit_without_completion_times_out() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;

    assert_eq!(radio.transmit(&[0x10; 10]).await, Err(RadioError::TransmitTimeout));

    // 1.5 times the 46336 us airtime, polled every 100 us
    assert_eq!(bench.yields(), 696);
    assert_eq!(radio.mode(), RadioMode::Standby(StandbyClock::Rc));
    assert_eq!(RadioError::TransmitTimeout.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn receive_shorter_than_a_symbol_times_out() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;

    let mut buffer = [0u8; 16];
    let result = radio.receive(&mut buffer, RxTimeout::After(1)).await;

    assert_eq!(result, Err(RadioError::ReceiveTimeout));
    // The hardware timeout is never zero, which would mean single shot without timeout
    assert_eq!(bench.frames_starting(0x82), vec![vec![0x82, 0x00, 0x00, 0x01]]);
    // Aborted: standby, then every flag cleared
    let frames = bench.frames();
    assert_eq!(&frames[frames.len() - 2..], &[vec![0x80, 0x00], vec![0x02, 0x03, 0xFF]]);
    assert_eq!(radio.mode(), RadioMode::Standby(StandbyClock::Rc));
    assert_eq!(bench.rf_switch().last(), Some(&RfSwitchState::Idle));
    assert_eq!(buffer, [0u8; 16]);
}

#[tokio::test]
async fn hardware_timeout_is_a_receive_timeout() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;
    irq_status(&bench, 0x0200);
    bench.raise_irq_after(Some(1));

    let mut buffer = [0u8; 16];
    assert_eq!(
        radio.receive(&mut buffer, RxTimeout::Default).await,
        Err(RadioError::ReceiveTimeout)
    );
    assert_eq!(radio.mode(), RadioMode::Standby(StandbyClock::Rc));
}

#[tokio::test]
async fn crc_error_still_delivers_the_payload() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;
    irq_status(&bench, 0x0042);
    bench.respond(0x13, &[STATUS, STATUS, 0x04, 0x00]);
    bench.respond(0x1E, &[STATUS, STATUS, STATUS, 0xDE, 0xAD, 0xBE, 0xEF]);
    bench.raise_irq_after(Some(1));

    let mut buffer = [0u8; 16];
    let result = radio.receive(&mut buffer, RxTimeout::Default).await;

    assert_eq!(result, Err(RadioError::CrcMismatch(4)));
    assert_eq!(result.unwrap_err().kind(), ErrorKind::Integrity);
    assert_eq!(buffer[..4], [0xDE, 0xAD, 0xBE, 0xEF]);
    assert_eq!(radio.packet_length(), Some(4));
    // RxDone, Timeout, CrcError and HeaderError routed to DIO1
    assert!(bench
        .frames()
        .contains(&vec![0x08, 0x02, 0x62, 0x02, 0x62, 0x00, 0x00, 0x00, 0x00]));
}

#[tokio::test]
async fn header_error_aborts_the_reception() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;
    irq_status(&bench, 0x0020);
    bench.raise_irq_after(Some(1));

    let mut buffer = [0u8; 16];
    let result = radio.receive(&mut buffer, RxTimeout::Default).await;

    assert_eq!(result, Err(RadioError::HeaderError));
    assert_eq!(radio.mode(), RadioMode::Standby(StandbyClock::Rc));
}

#[tokio::test]
async fn continuous_receive_keeps_listening() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;
    irq_status(&bench, 0x0002);
    bench.respond(0x13, &[STATUS, STATUS, 0x02, 0x00]);
    bench.respond(0x1E, &[STATUS, STATUS, STATUS, 0xAB, 0xCD]);
    bench.raise_irq_after(Some(1));

    radio
        .start_receive(RxConfig {
            timeout: RxTimeout::Never,
            expected_len: None,
        })
        .await
        .unwrap();
    assert_eq!(bench.frames_starting(0x82), vec![vec![0x82, 0xFF, 0xFF, 0xFF]]);

    let mut buffer = [0u8; 8];
    assert_eq!(radio.finish_receive(&mut buffer).await, Ok(2));
    assert_eq!(radio.mode(), RadioMode::Receive);
    assert_eq!(radio.finish_receive(&mut buffer).await, Ok(2));
    assert_eq!(buffer[..2], [0xAB, 0xCD]);

    radio.standby(StandbyClock::Rc).await.unwrap();
    assert_eq!(radio.finish_receive(&mut buffer).await, Err(RadioError::NothingStaged));
}

#[tokio::test]
async fn oversized_frames_are_rejected_before_any_write() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;

    let mut buffer = [0u8; 2];
    bench.respond(0x13, &[STATUS, STATUS, 0x04, 0x00]);
    irq_status(&bench, 0x0002);
    bench.raise_irq_after(Some(1));
    assert_eq!(
        radio.receive(&mut buffer, RxTimeout::Default).await,
        Err(RadioError::PayloadSizeUnexpected(4))
    );

    bench.clear();
    assert_eq!(
        radio.stage(ModeConfig::Transmit(&[0u8; 256])).await,
        Err(RadioError::PayloadSizeUnexpected(256))
    );
    assert!(bench.frames().is_empty());
}

#[tokio::test]
async fn channel_scan_reports_activity() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;
    bench.raise_irq_after(Some(1));

    irq_status(&bench, 0x0180);
    assert_eq!(radio.scan_channel().await, Ok(ChannelScanResult::Detected));
    assert!(bench.frames().contains(&vec![0xC5]));
    assert!(bench.frames().contains(&vec![0x88, 0x03, 20, 10, 0x00, 0x00, 0x00, 0x00]));

    irq_status(&bench, 0x0080);
    assert_eq!(radio.scan_channel().await, Ok(ChannelScanResult::Free));
    assert_eq!(radio.mode(), RadioMode::Standby(StandbyClock::Rc));
}

#[tokio::test]
async fn channel_scan_without_cad_done_times_out() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;

    assert_eq!(radio.scan_channel().await, Err(RadioError::ChannelScanTimeout));
    assert_eq!(radio.mode(), RadioMode::Standby(StandbyClock::Rc));
}

#[tokio::test]
async fn setters_check_the_active_modem() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;

    let fsk = ModulationConfig::Fsk(FskParams::from_kbps(50.0, 25.0, 117.3, PulseShape::Gaussian0_5));
    radio
        .set_modulation(fsk, PacketConfig::fsk_default(SyncWord::from_bytes(&[0xC1, 0x94, 0xC1]).unwrap()))
        .await
        .unwrap();
    assert_eq!(bench.frames_starting(0x8A), vec![vec![0x8A, 0x00]]);
    assert!(bench.frames().contains(&vec![0x0D, 0x06, 0xC0, 0xC1, 0x94, 0xC1]));

    bench.clear();
    assert_eq!(
        radio.set_spreading_factor(SpreadingFactor::_9).await,
        Err(RadioError::WrongModem)
    );
    assert_eq!(radio.set_bandwidth(Bandwidth::_250KHz).await, Err(RadioError::WrongModem));
    assert_eq!(radio.set_coding_rate(CodingRate::_4_8).await, Err(RadioError::WrongModem));
    assert_eq!(radio.get_snr().await, Err(RadioError::WrongModem));
    assert_eq!(radio.stage(ModeConfig::ChannelScan).await, Err(RadioError::Unsupported));
    assert!(bench.frames().is_empty());

    radio.set_preamble_length(32).await.unwrap();
    assert_eq!(radio.packet_config().preamble_length, 32);
}

#[tokio::test]
async fn lr_fhss_is_not_offered() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;

    let lr_fhss = ModulationConfig::LrFhss(LrFhssParams {
        coding_rate: LrFhssCodingRate::_2_3,
        grid: LrFhssGrid::_3_91KHz,
        bandwidth: LrFhssBandwidth::_136KHz,
        header_count: 2,
        hopping: true,
    });
    let packet = *radio.packet_config();
    assert_eq!(
        radio.set_modulation(lr_fhss, packet).await,
        Err(RadioError::UnsupportedModem(Modem::LrFhss))
    );
    assert_eq!(radio.modulation(), &lora());
    assert!(bench.frames().is_empty());
}

#[tokio::test]
async fn ranges_are_checked_before_any_write() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;

    assert_eq!(
        radio.set_frequency(100_000_000).await,
        Err(RadioError::InvalidFrequency(100_000_000))
    );
    assert_eq!(radio.set_output_power(23).await, Err(RadioError::InvalidOutputPower(23)));
    assert_eq!(
        radio.set_preamble_length(0).await,
        Err(RadioError::InvalidPreambleLength(0))
    );
    assert!(bench.frames().is_empty());
    assert_eq!(radio.frequency(), 868_100_000);
    assert_eq!(radio.output_power(), 14);
}

#[tokio::test]
async fn image_is_recalibrated_only_on_band_change() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;

    radio.set_frequency(915_000_000).await.unwrap();
    radio.set_frequency(916_000_000).await.unwrap();

    assert_eq!(bench.frames_starting(0x98), vec![vec![0x98, 0xE1, 0xE9]]);
    assert_eq!(bench.frames_starting(0x86)[0], vec![0x86, 0x39, 0x30, 0x00, 0x00]);
}

#[tokio::test]
async fn output_power_follows_the_pa_table() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;

    radio.set_output_power(20).await.unwrap();

    assert_eq!(bench.frames_starting(0x95), vec![vec![0x95, 0x03, 0x05, 0x00, 0x01]]);
    assert_eq!(bench.frames_starting(0x8E), vec![vec![0x8E, 22, 0x02]]);
}

#[tokio::test]
async fn lora_packet_status() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;
    bench.respond(0x14, &[STATUS, STATUS, 0x40, 0x28, 0x42]);

    assert_eq!(radio.get_rssi().await, Ok(-32));
    assert_eq!(radio.get_snr().await, Ok(10));
}

#[tokio::test]
async fn explicit_transitions_drive_the_rf_switch() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;

    radio.sleep().await.unwrap();
    assert_eq!(bench.frames(), vec![vec![0x84, 0x04]]);
    assert_eq!(radio.mode(), RadioMode::Sleep);

    bench.clear();
    radio.standby(StandbyClock::Xosc).await.unwrap();
    radio.frequency_synthesis().await.unwrap();
    radio.transmit_direct().await.unwrap();

    assert_eq!(
        bench.frames(),
        vec![vec![0x80, 0x01], vec![0xC1], vec![0x80, 0x00], vec![0xD1]]
    );
    assert_eq!(
        bench.rf_switch(),
        vec![
            RfSwitchState::Idle,
            RfSwitchState::Idle,
            RfSwitchState::Idle,
            RfSwitchState::Tx
        ]
    );
    assert_eq!(radio.mode(), RadioMode::Transmit);
}

#[tokio::test]
async fn time_on_air_uses_the_active_configuration() {
    let bench = answering_bench();
    let radio = radio(&bench).await;

    assert_eq!(PhysicalLayer::get_time_on_air(&radio, 10), 46336);
    assert_eq!(radio.time_on_air(255), 548096);
}

#[tokio::test]
async fn every_transaction_reaches_the_log_hook() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;

    radio.standby(StandbyClock::Rc).await.unwrap();

    assert!(bench.logged_transactions() > 0);
    assert_eq!(bench.frames().len(), 1);
}

#[tokio::test]
async fn buffers_larger_than_a_frame_are_accepted() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;
    irq_status(&bench, 0x0002);
    bench.respond(0x13, &[STATUS, STATUS, 0x02, 0x00]);
    bench.respond(0x1E, &[STATUS, STATUS, STATUS, 0xAB, 0xCD]);
    bench.raise_irq_after(Some(1));

    let mut buffer = [0u8; 512];
    assert_eq!(radio.receive(&mut buffer, RxTimeout::Default).await, Ok(2));

    assert_eq!(buffer[..2], [0xAB, 0xCD]);
    // Framing sized for the largest frame
    assert!(bench
        .frames()
        .contains(&vec![0x8C, 0x00, 0x08, 0x00, 0xFF, 0x01, 0x00]));
}

#[tokio::test]
async fn failed_go_command_drops_the_staged_request() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;
    radio.stage(ModeConfig::Transmit(&[0x01, 0x02])).await.unwrap();
    // Execution error reported in the status byte of SetTx
    bench.respond(0x83, &[0x2A, 0x2A]);

    assert_eq!(radio.launch().await, Err(RadioError::CommandFailed));
    assert_eq!(radio.launch().await, Err(RadioError::NothingStaged));
    assert_eq!(radio.mode(), RadioMode::Standby(StandbyClock::Rc));
    assert_eq!(bench.rf_switch().last(), Some(&RfSwitchState::Idle));
    assert_eq!(bench.frames_starting(0x83).len(), 1);
}

#[tokio::test]
async fn high_power_pa_reaches_22_dbm() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;

    radio.set_output_power(21).await.unwrap();
    radio.set_output_power(22).await.unwrap();

    assert_eq!(
        bench.frames_starting(0x95),
        vec![vec![0x95, 0x04, 0x07, 0x00, 0x01], vec![0x95, 0x04, 0x07, 0x00, 0x01]]
    );
    assert_eq!(bench.frames_starting(0x8E), vec![vec![0x8E, 21, 0x02], vec![0x8E, 22, 0x02]]);
}

#[tokio::test]
async fn wide_bandwidths_need_a_high_carrier() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;

    radio.set_bandwidth(Bandwidth::_500KHz).await.unwrap();
    bench.clear();
    assert_eq!(
        radio.set_frequency(169_000_000).await,
        Err(RadioError::InvalidBandwidthForFrequency)
    );
    assert!(bench.frames().is_empty());
    assert_eq!(radio.frequency(), 868_100_000);

    radio.set_bandwidth(Bandwidth::_125KHz).await.unwrap();
    radio.set_frequency(169_000_000).await.unwrap();
    bench.clear();
    assert_eq!(
        radio.set_bandwidth(Bandwidth::_250KHz).await,
        Err(RadioError::InvalidBandwidthForFrequency)
    );
    assert!(bench.frames().is_empty());
    assert_eq!(radio.modulation(), &lora());

    let config = RadioConfig {
        modulation: ModulationConfig::LoRa(LoRaParams {
            spreading_factor: SpreadingFactor::_7,
            bandwidth: Bandwidth::_500KHz,
            coding_rate: CodingRate::_4_5,
            ldro: Ldro::Off,
        }),
        frequency_in_hz: 169_000_000,
        ..radio_config()
    };
    assert_eq!(radio.configure(config).await, Err(RadioError::InvalidBandwidthForFrequency));
    assert!(bench.frames().is_empty());
}

#[tokio::test]
async fn current_limit_is_written_in_2_5_ma_steps() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;

    assert_eq!(radio.set_current_limit(141).await, Err(RadioError::InvalidCurrentLimit(141)));
    assert!(bench.frames().is_empty());

    radio.set_current_limit(140).await.unwrap();
    assert_eq!(bench.frames(), vec![vec![0x0D, 0x08, 0xE7, 56]]);

    // SetPAConfig resets the limit, so it is written again afterwards
    bench.clear();
    radio.set_output_power(10).await.unwrap();
    assert_eq!(bench.frames().last(), Some(&vec![0x0D, 0x08, 0xE7, 56]));
}

#[tokio::test]
async fn random_numbers_come_from_a_deaf_receiver() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;
    radio.stage(ModeConfig::Transmit(&[0x01])).await.unwrap();
    bench.clear();
    bench.respond(0x1D, &[STATUS, STATUS, STATUS, STATUS, 0xDE, 0xAD, 0xBE, 0xEF]);

    assert_eq!(radio.random_number().await, Ok(0xDEAD_BEEF));

    // LNA and mixer off while sampling, then restored
    assert_eq!(
        bench.frames_starting(0x0D),
        vec![
            vec![0x0D, 0x08, 0xE2, 0xDE],
            vec![0x0D, 0x08, 0xE5, 0x5E],
            vec![0x0D, 0x08, 0xE2, 0xDE],
            vec![0x0D, 0x08, 0xE5, 0xDE],
        ]
    );
    assert_eq!(bench.frames_starting(0x82), vec![vec![0x82, 0xFF, 0xFF, 0xFF]]);
    assert_eq!(bench.frames().last(), Some(&vec![0x0D, 0x08, 0xE5, 0xDE]));
    assert_eq!(radio.mode(), RadioMode::Standby(StandbyClock::Rc));
    assert_eq!(radio.launch().await, Err(RadioError::NothingStaged));

    assert_eq!(radio.random_byte().await, Ok(0xEF));
}

#[tokio::test]
async fn lora_frequency_error() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;

    bench.respond(0x1D, &[STATUS, STATUS, STATUS, STATUS, 0x00, 0x10, 0x00]);
    assert_eq!(radio.frequency_error().await, Ok(496));

    // Upper nibble of the first byte is not part of the estimate
    bench.respond(0x1D, &[STATUS, STATUS, STATUS, STATUS, 0xFF, 0xFF, 0x00]);
    assert_eq!(radio.frequency_error().await, Ok(-31));

    let fsk = ModulationConfig::Fsk(FskParams::from_kbps(50.0, 25.0, 117.3, PulseShape::Gaussian0_5));
    radio
        .set_modulation(fsk, PacketConfig::fsk_default(SyncWord::from_bytes(&[0xC1, 0x94]).unwrap()))
        .await
        .unwrap();
    assert_eq!(radio.frequency_error().await, Err(RadioError::WrongModem));
}

#[tokio::test]
async fn duty_cycle_periods_use_15_625_us_steps() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;

    radio
        .start_receive_duty_cycle(DutyCycle {
            rx_period_us: 10_000,
            sleep_period_us: 100_000,
        })
        .await
        .unwrap();

    // 640 and 6400 steps
    assert_eq!(
        bench.frames_starting(0x94),
        vec![vec![0x94, 0x00, 0x02, 0x80, 0x00, 0x19, 0x00]]
    );
    assert!(bench.frames_starting(0x82).is_empty());
    // Routed like a regular reception
    assert!(bench
        .frames()
        .contains(&vec![0x08, 0x02, 0x62, 0x02, 0x62, 0x00, 0x00, 0x00, 0x00]));
    assert_eq!(radio.mode(), RadioMode::Receive);
    assert_eq!(bench.rf_switch().last(), Some(&RfSwitchState::Rx));
}

#[tokio::test]
async fn duty_cycle_ends_after_one_frame() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;
    irq_status(&bench, 0x0002);
    bench.respond(0x13, &[STATUS, STATUS, 0x01, 0x00]);
    bench.respond(0x1E, &[STATUS, STATUS, STATUS, 0x42]);

    // 1024 us symbols: 48 symbols asleep, 9 awake
    radio.start_receive_duty_cycle_auto(64, 0).await.unwrap();
    assert_eq!(
        bench.frames_starting(0x94),
        vec![vec![0x94, 0x00, 0x02, 0x4D, 0x00, 0x0C, 0x49]]
    );

    bench.raise_irq_after(Some(1));
    let mut buffer = [0u8; 4];
    assert_eq!(radio.finish_receive(&mut buffer).await, Ok(1));
    assert_eq!(buffer[0], 0x42);
    assert_eq!(radio.mode(), RadioMode::Standby(StandbyClock::Rc));
    assert_eq!(radio.finish_receive(&mut buffer).await, Err(RadioError::NothingStaged));
}

#[tokio::test]
async fn short_preambles_fall_back_to_continuous_reception() {
    let bench = answering_bench();
    let mut radio = radio(&bench).await;

    // The configured 8 symbol preamble cannot hold two 8 symbol windows
    radio.start_receive_duty_cycle_auto(0, 0).await.unwrap();

    assert!(bench.frames_starting(0x94).is_empty());
    assert_eq!(bench.frames_starting(0x82), vec![vec![0x82, 0xFF, 0xFF, 0xFF]]);
    assert_eq!(radio.mode(), RadioMode::Receive);
}
