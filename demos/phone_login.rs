//! Demonstrates the SMS one-time-code login flow with the in-memory store and
//! capture gateway.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
// self
use connect_broker::{ext::MemorySms, flows::PhoneLogin, store::MemoryStore};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let store = Arc::new(MemoryStore::default());
	let sms = Arc::new(MemorySms::new());
	let login = PhoneLogin::new(store, sms.clone());
	let phone = "+1 (555) 123-4567";
	let code = login.start(phone).await?;

	if let Some(delivered) = sms.sent().into_iter().next() {
		println!("Delivered \"{}\" to {}.", delivered.body, delivered.to);
	}

	// The real user types the code off their handset; here we already hold it.
	if login.verify(phone, &code).await? {
		println!("Phone {phone} verified.");
	} else {
		eprintln!("Verification failed.");
	}

	println!("Resend allowed immediately: {}.", login.resend(phone).await?);
	println!("Cooldown remaining: {}.", login.resend_timeout(phone).await?);

	Ok(())
}
