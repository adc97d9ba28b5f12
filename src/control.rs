//! Text attributes for the control surface.
//!
//! Readers fill a caller-provided buffer and return the byte count, or `0`
//! when the buffer cannot hold the value. Writers take the raw bytes handed
//! over by the transport.

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::autosleep::Autosleep;
use crate::depth::TargetDepth;
use crate::error::{Error, Result};
use crate::floor::PowerFloorMode;

fn write_line(buf: &mut [u8], value: &[u8], newline: bool) -> usize {
    let len = value.len() + usize::from(newline);
    let Some(out) = buf.get_mut(..len) else {
        return 0;
    };
    out[..value.len()].copy_from_slice(value);
    if newline {
        out[value.len()] = b'\n';
    }
    len
}

impl<M: RawMutex> Autosleep<'_, M> {
    /// `autosleep_phase`: `on` or `mem`, newline terminated.
    pub fn show_phase(&self, buf: &mut [u8]) -> usize {
        write_line(buf, self.phase().label().as_bytes(), true)
    }

    /// `cpu_power_floor`: the mode as a single digit.
    pub fn show_power_floor(&self, buf: &mut [u8]) -> usize {
        write_line(buf, &[self.power_floor_mode().digit()], false)
    }

    /// Only the first byte is looked at. Anything outside `0..=2` is
    /// dropped without an error, and the whole input always counts as
    /// consumed.
    pub fn store_power_floor(&self, input: &[u8]) -> usize {
        let mode = input
            .first()
            .and_then(|b| b.checked_sub(b'0'))
            .and_then(PowerFloorMode::from_raw);
        match mode {
            Some(mode) => self.set_power_floor_mode(mode),
            None => trace!("autosleep: ignoring power floor write"),
        }
        input.len()
    }

    /// `autosleep`: label of the current target, newline terminated.
    pub fn show_autosleep(&self, buf: &mut [u8]) -> usize {
        write_line(buf, self.target().label().as_bytes(), true)
    }

    /// Parse a depth label and make it the target.
    pub async fn store_autosleep(&self, input: &[u8]) -> Result<usize> {
        let label = core::str::from_utf8(input).map_err(|_| Error::InvalidArgument)?;
        let depth = TargetDepth::from_label(label).ok_or(Error::InvalidArgument)?;
        self.set_target(depth).await?;
        Ok(input.len())
    }
}
