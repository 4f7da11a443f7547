//! Logging facade: `defmt` on the target, `log` on the host

#[cfg(not(target_arch = "x86_64"))]
pub use defmt::*;

#[cfg(target_arch = "x86_64")]
pub use log::*;

#[cfg(target_arch = "x86_64")]
use core::fmt;

#[cfg(target_arch = "x86_64")]
/// Display a value through its Debug implementation, as `defmt` does
pub struct Debug2Format<'a, T: fmt::Debug + ?Sized>(pub &'a T);

#[cfg(target_arch = "x86_64")]
impl<T: fmt::Debug + ?Sized> fmt::Display for Debug2Format<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}
