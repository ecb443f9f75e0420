use core::panic::PanicInfo;

use defmt::{Display2Format, error};

/// Logs the panic over the espflash defmt channel and parks the core; the
/// relays keep whatever level they were last driven to.
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    error!("firmware panic: {}", Display2Format(info));
    loop {
        core::hint::spin_loop();
    }
}
