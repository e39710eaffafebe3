//! One-shot GPIO interrupt set-up for the anchor-arm button.
//!
//! Configures the button pin and installs its falling-edge ISR using raw
//! ESP-IDF sys calls.  Called once from `main()` before the consumer
//! loops start.  The I2C buses and indicator pins are owned through
//! `esp-idf-hal` drivers instead.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

// ── Error type ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
        }
    }
}

// ── Button ISR ────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe extern "C" fn arm_button_gpio_isr(_arg: *mut core::ffi::c_void) {
    // SAFETY: esp_timer_get_time is a RTC counter read; safe in ISR context.
    let now_ms = (unsafe { esp_timer_get_time() } / 1_000) as u32;
    crate::drivers::button::arm_button_isr(now_ms);
}

/// Configure the button as a pulled-up input and register its ISR.
#[cfg(target_os = "espidf")]
pub fn init_button_isr(gpio: i32) -> Result<(), HwInitError> {
    // SAFETY: called once from main() before any consumer loop runs.
    // The handler only touches the button's atomics.
    unsafe {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << gpio,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_NEGEDGE,
        };
        let ret = gpio_config(&cfg);
        if ret != ESP_OK {
            return Err(HwInitError::GpioConfigFailed(ret));
        }

        // ESP_ERR_INVALID_STATE: service already installed.
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        let ret = gpio_isr_handler_add(gpio, Some(arm_button_gpio_isr), core::ptr::null_mut());
        if ret != ESP_OK {
            return Err(HwInitError::IsrInstallFailed(ret));
        }
        gpio_intr_enable(gpio);
    }
    log::info!("hw_init: arm button ISR on GPIO{}", gpio);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_button_isr(gpio: i32) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): button ISR on GPIO{} skipped", gpio);
    Ok(())
}
