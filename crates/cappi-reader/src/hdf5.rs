//! HDF5 diagnostics control.

use std::sync::Once;

/// Silence HDF5's automatic error printing to stderr.
///
/// Looking up a variable that a CAPPI file does not carry (an absent band, or
/// the `latitude` fallback name) is an ordinary outcome here, but the HDF5 C
/// library still prints a diagnostic stack for it:
///
/// ```text
/// HDF5-DIAG: Error detected in HDF5 (1.10.8) thread 0:
///   #000: ../../../src/H5L.c line 943 in H5Lexists(): unable to get link info
/// ```
///
/// Called on every [`crate::BandReader::open`]; the handler is replaced once
/// per process.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and null handlers are a
        // documented way to disable automatic error output.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}
