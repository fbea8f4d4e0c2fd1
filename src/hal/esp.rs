//! ESP-IDF implementation of the platform traits.
//!
//! Thin wrappers around the ESP-IDF GPIO driver, the GPIO ISR service,
//! FreeRTOS task creation and task notifications. No logic lives here.

use core::ffi::c_void;
use core::num::NonZeroU32;
use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

use esp_idf_svc::hal::delay::BLOCK;
use esp_idf_svc::hal::task;
use esp_idf_svc::sys;

use super::{
    Clock, Direction, EdgeInterrupts, EdgeTrigger, IsrHandler, PinConfig, PinControl, PinId,
    PinWriter, PlatformError, TaskBody, TaskHandle, TaskSpawner,
};
use crate::handshake::Parker;

/// Notification value sent on every unpark. Only "non-zero" matters.
const WAKE_BITS: NonZeroU32 = match NonZeroU32::new(1) {
    Some(bits) => bits,
    None => unreachable!(),
};

fn check(code: sys::esp_err_t) -> Result<(), PlatformError> {
    if code == sys::ESP_OK as sys::esp_err_t {
        Ok(())
    } else {
        Err(PlatformError::new(code))
    }
}

/// Board-level platform: pin setup, ISR routing, task creation.
pub struct EspPlatform {
    isr_flags: i32,
    isr_service_installed: bool,
    /// Pins configured so far, for the IO dump.
    configured: u64,
}

impl EspPlatform {
    pub const fn new(isr_flags: i32) -> Self {
        Self {
            isr_flags,
            isr_service_installed: false,
            configured: 0,
        }
    }

    /// Output writer + clock handed to the worker task.
    pub const fn io(&self) -> EspIo {
        EspIo
    }

    fn install_isr_service(&mut self) -> Result<(), PlatformError> {
        if self.isr_service_installed {
            return Ok(());
        }

        let code = unsafe { sys::gpio_install_isr_service(self.isr_flags) };
        // Already installed by another component: usable as is.
        if code != sys::ESP_ERR_INVALID_STATE as sys::esp_err_t {
            check(code)?;
        }

        self.isr_service_installed = true;
        Ok(())
    }
}

impl PinControl for EspPlatform {
    fn configure_pin(&mut self, pin: PinId, config: &PinConfig) -> Result<(), PlatformError> {
        let gpio_config = sys::gpio_config_t {
            pin_bit_mask: pin.mask(),
            mode: match config.direction {
                Direction::Input => sys::gpio_mode_t_GPIO_MODE_INPUT,
                Direction::Output => sys::gpio_mode_t_GPIO_MODE_OUTPUT,
            },
            pull_up_en: if config.pull_up {
                sys::gpio_pullup_t_GPIO_PULLUP_ENABLE
            } else {
                sys::gpio_pullup_t_GPIO_PULLUP_DISABLE
            },
            pull_down_en: if config.pull_down {
                sys::gpio_pulldown_t_GPIO_PULLDOWN_ENABLE
            } else {
                sys::gpio_pulldown_t_GPIO_PULLDOWN_DISABLE
            },
            intr_type: match config.edge {
                EdgeTrigger::Disabled => sys::gpio_int_type_t_GPIO_INTR_DISABLE,
                EdgeTrigger::Rising => sys::gpio_int_type_t_GPIO_INTR_POSEDGE,
                EdgeTrigger::Falling => sys::gpio_int_type_t_GPIO_INTR_NEGEDGE,
                EdgeTrigger::Any => sys::gpio_int_type_t_GPIO_INTR_ANYEDGE,
            },
            ..Default::default()
        };

        check(unsafe { sys::gpio_config(&gpio_config) })?;
        self.configured |= pin.mask();
        Ok(())
    }

    /// Dumps only the pins this platform configured, not every valid GPIO:
    /// the rest of the table is unused pins and flash/PSRAM lines.
    fn dump_configuration(&mut self) -> Result<(), PlatformError> {
        // SAFETY: fd 1 is the VFS console. The FILE is never closed: fclose
        // would close fd 1 as well.
        let out = unsafe { sys::fdopen(1, c"w".as_ptr()) };
        if out.is_null() {
            return Err(PlatformError::new(sys::ESP_FAIL as sys::esp_err_t));
        }

        let code = unsafe { sys::gpio_dump_io_configuration(out, self.configured) };
        unsafe {
            sys::fflush(out);
        }
        check(code)
    }
}

impl EdgeInterrupts for EspPlatform {
    fn register_edge_handler<H: IsrHandler>(
        &mut self,
        pin: PinId,
        handler: &'static H,
    ) -> Result<(), PlatformError> {
        self.install_isr_service()?;

        let arg = handler as *const H as *mut c_void;
        check(unsafe {
            sys::gpio_isr_handler_add(pin.number() as sys::gpio_num_t, Some(edge_trampoline::<H>), arg)
        })
    }
}

impl TaskSpawner for EspPlatform {
    fn spawn<T: TaskBody>(
        &mut self,
        spec: &super::TaskSpec,
        body: &'static mut T,
    ) -> Result<TaskHandle, PlatformError> {
        let mut handle: sys::TaskHandle_t = ptr::null_mut();

        let created = unsafe {
            sys::xTaskCreatePinnedToCore(
                Some(task_trampoline::<T>),
                spec.name.as_ptr(),
                spec.stack_bytes,
                body as *mut T as *mut c_void,
                spec.priority,
                &mut handle,
                sys::tskNO_AFFINITY as sys::BaseType_t,
            )
        };

        if created != sys::pdPASS as sys::BaseType_t {
            return Err(PlatformError::new(sys::ESP_ERR_NO_MEM as sys::esp_err_t));
        }
        Ok(TaskHandle::from_raw(handle as usize))
    }
}

impl Clock for EspPlatform {
    fn uptime_us(&self) -> i64 {
        unsafe { sys::esp_timer_get_time() }
    }
}

/// Output writer and clock for the worker task. Stateless.
#[derive(Clone, Copy, Debug, Default)]
pub struct EspIo;

impl PinWriter for EspIo {
    fn write_pin(&mut self, pin: PinId, level: bool) -> Result<(), PlatformError> {
        check(unsafe { sys::gpio_set_level(pin.number() as sys::gpio_num_t, level as u32) })
    }
}

impl Clock for EspIo {
    fn uptime_us(&self) -> i64 {
        unsafe { sys::esp_timer_get_time() }
    }
}

/// Handshake parker backed by FreeRTOS direct-to-task notifications.
///
/// A notification sent before the task blocks is kept by the kernel, and
/// several notifications collapse into one pending value cleared on take.
pub struct EspParker {
    task: AtomicPtr<sys::tskTaskControlBlock>,
}

impl EspParker {
    pub const fn new() -> Self {
        Self {
            task: AtomicPtr::new(ptr::null_mut()),
        }
    }
}

impl Default for EspParker {
    fn default() -> Self {
        Self::new()
    }
}

impl Parker for EspParker {
    fn bind_current(&self) {
        if let Some(current) = task::current() {
            self.task.store(current, Ordering::Release);
        }
    }

    fn park(&self) {
        let _ = task::wait_notification(BLOCK);
    }

    fn unpark_from_isr(&self) {
        let target = self.task.load(Ordering::Acquire);
        if target.is_null() {
            return;
        }
        // SAFETY: `target` was stored by the worker itself, which never exits.
        unsafe {
            task::notify_and_yield(target, WAKE_BITS);
        }
    }
}

unsafe extern "C" fn edge_trampoline<H: IsrHandler>(arg: *mut c_void) {
    // SAFETY: `arg` is the `&'static H` passed to `register_edge_handler`.
    let handler = unsafe { &*(arg as *const H) };
    handler.on_edge();
}

unsafe extern "C" fn task_trampoline<T: TaskBody>(arg: *mut c_void) {
    // SAFETY: `arg` is the `&'static mut T` handed over in `spawn`; the task
    // is its only user from here on.
    let body = unsafe { &mut *(arg as *mut T) };
    body.run()
}
