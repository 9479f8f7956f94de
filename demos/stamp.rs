//! Stamp, recover and cancel against the DFacture test endpoint.
//!
//! ```text
//! cargo run --example stamp -- stamp signed.xml
//! cargo run --example stamp -- recover 25D0B1B7-2FAE-4E92-BDE1-CF26AA1FBA22
//! cargo run --example stamp -- cancel 25D0B1B7-2FAE-4E92-BDE1-CF26AA1FBA22 csd.cer csd.key 12345678a
//! ```

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use dfacture::*;

const USERNAME: &str = "DEMODaysoft";
const PASSWORD: &str = "cfdi";
const ISSUER: &str = "H&E951128469";
const RECIPIENT: &str = "XAXX010101000";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = ClientConfig::builder(USERNAME, PASSWORD).url(URL_TEST).build()?;
    let client = StampClient::new(config);

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["stamp", path] => {
            let xml = std::fs::read(path)?;
            report(client.stamp_bytes(&xml))?;
        }
        ["recover", uuid] => {
            report(client.get_stamp(ISSUER, uuid))?;
        }
        ["cancel", uuid, cer, key, password] => {
            let request = CancellationRequest::new(
                ISSUER,
                RECIPIENT,
                *uuid,
                "81.20",
                STANDARD.encode(std::fs::read(cer)?),
                STANDARD.encode(std::fs::read(key)?),
                *password,
                CancellationReason::ErrorsWithoutRelation,
            );
            match client.cancel_with_status(&request) {
                Ok(status) => println!("Cancel: {status:?} ({})", status.code()),
                Err(StampError::BusinessRejection { code, message }) => {
                    println!("Rejected [{code}]: {message}")
                }
                Err(e) => return Err(e.into()),
            }
        }
        _ => {
            eprintln!("usage: stamp <file> | recover <uuid> | cancel <uuid> <cer> <key> <password>");
            std::process::exit(2);
        }
    }
    Ok(())
}

fn report(result: Result<StampResult, StampError>) -> Result<(), Box<dyn std::error::Error>> {
    match result {
        Ok(tfd) => {
            println!("{}", tfd.to_xml_string()?);
            println!("{tfd}");
        }
        Err(StampError::BusinessRejection { code, message }) => {
            println!("Rejected [{code}]: {message}");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
