#![no_main]

use dfacture::cfdi::{Cfdi, Document};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Errors are fine, panics are bugs.
    if let Ok(cfdi) = Cfdi::from_xml_bytes(data) {
        let _ = cfdi.find_stamp();
    }
});
