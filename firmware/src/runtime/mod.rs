use core::cell::RefCell;

use alloc::boxed::Box;
use defmt::info;
use embassy_executor::Spawner;
use embassy_net::{Ipv4Cidr, Runner, StackResources, StaticConfigV4};
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use esp_hal::analog::adc::{Adc, AdcConfig, Attenuation};
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;
use esp_println as _;
use esp_wifi::EspWifiController;
use esp_wifi::wifi::WifiDevice;
use outlet_core::config::ControllerConfig;
use outlet_core::controller::Controller;
use outlet_core::router::RequestRouter;
use outlet_core::sensor::{Acs712, Acs712Range, CurrentSensor};
use static_cell::StaticCell;

use crate::config;
use crate::hw::{FirmwareInstant, IndicatorLeds, PacedInput, RelayOutputs};
use crate::status;

mod control_task;
mod dhcp_task;
mod http_task;
mod mdns_task;
mod wifi_task;

esp_bootloader_esp_idf::esp_app_desc!();

/// Controller wired to the board: relays, LEDs and the ACS712 on GPIO35.
pub(crate) type BoardController = Controller<
    RelayOutputs<'static>,
    IndicatorLeds<'static>,
    &'static mut dyn CurrentSensor,
    FirmwareInstant,
>;

/// Router shared by the HTTP workers and the control task.
///
/// Every access is a short synchronous critical section; nothing awaits while
/// the router is borrowed.
pub(crate) type SharedRouter = Mutex<NoopRawMutex, RefCell<RequestRouter<BoardController>>>;

// HTTP workers, DHCP, mDNS, plus headroom.
const SOCKET_COUNT: usize = 6;

static ROUTER: StaticCell<SharedRouter> = StaticCell::new();
static WIFI_INIT: StaticCell<EspWifiController<'static>> = StaticCell::new();
static STACK_RESOURCES: StaticCell<StackResources<SOCKET_COUNT>> = StaticCell::new();

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    let peripherals = esp_hal::init(esp_hal::Config::default().with_cpu_clock(CpuClock::max()));
    esp_alloc::heap_allocator!(size: 72 * 1024);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_hal_embassy::init(timg0.timer0);
    info!("outlet controller starting");

    let relays = RelayOutputs::new(
        Output::new(peripherals.GPIO33, Level::Low, OutputConfig::default()),
        Output::new(peripherals.GPIO25, Level::Low, OutputConfig::default()),
    );
    let leds = IndicatorLeds::new(
        Output::new(peripherals.GPIO21, Level::Low, OutputConfig::default()),
        Output::new(peripherals.GPIO19, Level::Low, OutputConfig::default()),
        Output::new(peripherals.GPIO18, Level::Low, OutputConfig::default()),
    );

    let mut adc_config = AdcConfig::new();
    let mut current_pin = adc_config.enable_pin(peripherals.GPIO35, Attenuation::_11dB);
    let mut adc = Adc::new(peripherals.ADC1, adc_config);
    let convert = move || loop {
        if let Ok(raw) = adc.read_oneshot(&mut current_pin) {
            break raw;
        }
    };
    let mut sensor = Acs712::new(
        PacedInput::new(convert, config::ADC_SPACING_US),
        Acs712Range::Amps5,
    )
    .with_window(config::ADC_WINDOW);
    let zero = sensor.calibrate();
    info!("current sensor zero point: {} counts", zero);
    let sensor: &'static mut dyn CurrentSensor = Box::leak(Box::new(sensor));

    let controller = Controller::new(relays, leds, sensor, ControllerConfig::DEFAULT);
    let router: &'static SharedRouter =
        ROUTER.init(Mutex::new(RefCell::new(RequestRouter::new(controller))));
    log_status(router, FirmwareInstant::now());

    let timg1 = TimerGroup::new(peripherals.TIMG1);
    let mut rng = Rng::new(peripherals.RNG);
    let seed = (u64::from(rng.random()) << 32) | u64::from(rng.random());
    let wifi_init = WIFI_INIT.init(
        esp_wifi::init(timg1.timer0, rng, peripherals.RADIO_CLK).expect("esp-wifi init"),
    );
    let (wifi_controller, interfaces) =
        esp_wifi::wifi::new(wifi_init, peripherals.WIFI).expect("wifi peripheral");

    let net_config = embassy_net::Config::ipv4_static(StaticConfigV4 {
        address: Ipv4Cidr::new(config::AP_ADDRESS, config::AP_PREFIX_LEN),
        gateway: Some(config::AP_ADDRESS),
        dns_servers: Default::default(),
    });
    let (stack, runner) = embassy_net::new(
        interfaces.ap,
        net_config,
        STACK_RESOURCES.init(StackResources::new()),
        seed,
    );

    spawner
        .spawn(wifi_task::run(wifi_controller))
        .expect("failed to spawn Wi-Fi task");
    spawner
        .spawn(net_task(runner))
        .expect("failed to spawn network task");
    spawner
        .spawn(control_task::run(router))
        .expect("failed to spawn control task");
    spawner
        .spawn(dhcp_task::run(stack))
        .expect("failed to spawn DHCP task");
    spawner
        .spawn(mdns_task::run(stack))
        .expect("failed to spawn mDNS task");
    for worker in 0..config::HTTP_WORKERS {
        spawner
            .spawn(http_task::run(stack, router, worker))
            .expect("failed to spawn HTTP worker");
    }

    core::future::pending::<()>().await;
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}

/// Logs the five status lines for the controller as of `now`.
pub(crate) fn log_status(router: &SharedRouter, now: FirmwareInstant) {
    let lines = router.lock(|cell| status::render(&cell.borrow().controller().status(now)));
    for line in &lines {
        info!("{}", line.as_str());
    }
}
