#![no_main]

use dfacture::client::{Binding, SoapRequest, Transport, URL_TEST};
use dfacture::{ClientConfig, StampClient, TransportError};
use libfuzzer_sys::fuzz_target;

/// Replays the fuzz input as the service's response body.
struct Replay(String);

impl Transport for Replay {
    fn call(&self, _binding: &Binding, _request: &SoapRequest) -> Result<String, TransportError> {
        Ok(self.0.clone())
    }
}

fuzz_target!(|data: &[u8]| {
    if let Ok(body) = std::str::from_utf8(data) {
        let Ok(config) = ClientConfig::builder("fuzz", "fuzz").url(URL_TEST).build() else {
            return;
        };
        let client: StampClient<_> = StampClient::with_transport(config, Replay(body.to_string()));
        // Arbitrary envelopes must not panic.
        let _ = client.stamp_base64("");
        let _ = client.get_stamp("AAA010101AAA", "uuid");
    }
});
