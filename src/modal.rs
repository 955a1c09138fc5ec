/*
 * Drives one modal invocation: size the template, build it in a host arena and
 * hand it to the host's run-loop. The arena is sized from a dry-run of the
 * descriptor, never from a fixed constant, and lives only for the duration of
 * the call.
 */

use crate::arena::Arena;
use crate::byte_writer::ByteWriter;
use crate::dialog::DialogDescriptor;
use crate::error::{DialogError, Result};
use crate::host::{DialogHost, DialogProcedure};
use crate::types::WindowHandle;

pub struct ModalEngine<'h, H: DialogHost + ?Sized> {
    host: &'h H,
}

impl<'h, H: DialogHost + ?Sized> ModalEngine<'h, H> {
    pub fn new(host: &'h H) -> Self {
        Self { host }
    }

    /*
     * Blocks until the dialog is dismissed and returns the run-loop's result
     * unchanged. Any error is a setup failure: no dialog was created and the
     * procedure was never called.
     */
    pub fn run(
        &self,
        descriptor: &DialogDescriptor,
        procedure: &mut dyn DialogProcedure,
        parent: Option<WindowHandle>,
    ) -> Result<isize> {
        let count = descriptor.controls().len();
        if count > u16::MAX as usize {
            return Err(DialogError::TooManyControls { count });
        }

        let capacity = descriptor.serialized_size()?;
        log::debug!(
            "ModalEngine: '{}' needs {capacity} bytes for {count} controls",
            descriptor.caption()
        );

        let mut arena = Arena::acquire(self.host, capacity)?;
        {
            let mut bytes = arena.lock()?;
            let mut writer = ByteWriter::new(&mut bytes);
            descriptor.serialize(&mut writer)?;
            if writer.position() != capacity {
                log::error!(
                    "ModalEngine: wrote {} bytes into a {capacity} byte arena",
                    writer.position()
                );
                return Err(DialogError::OperationFailed(format!(
                    "template size mismatch: wrote {} of {capacity} bytes",
                    writer.position()
                )));
            }
            bytes.unlock();
        }

        log::debug!(
            "ModalEngine: entering run-loop for '{}' (parent {parent:?})",
            descriptor.caption()
        );
        let result = self.host.run_modal(arena.memory(), procedure, parent);
        log::debug!("ModalEngine: '{}' returned {result}", descriptor.caption());

        arena.release();
        Ok(result)
    }
}
