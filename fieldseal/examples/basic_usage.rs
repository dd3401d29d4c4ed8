//! Basic usage example for fieldseal.

use fieldseal::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Fieldseal Basic Usage Example");
    println!("=============================\n");

    // A ring with one secret: version 0 is current
    let ring = KeyRing::derive(&[Secret::high_entropy(vec![42u8; 32])])?;
    println!("✓ Key ring derived ({} key)\n", ring.len());

    // An email field with equality search enabled
    let email = FieldEncryptor::new(ValueKind::Text).searchable();
    let value = Value::Text("alice@example.com".to_string());

    // Seal: encrypt and digest a lookup token
    let sealed = email.seal(&value, &ring)?;
    let blob = sealed.envelope().to_bytes()?;
    println!("Plaintext: alice@example.com");
    println!("✓ Sealed ({} envelope bytes)", blob.len());
    if let Some(token) = sealed.token() {
        println!("✓ Blind index token: {token}\n");
    }

    // Open: decrypt and decode
    let opened = email.open(&sealed, &ring)?;
    assert_eq!(value, opened);
    println!("✓ Round-trip verification successful\n");

    // Rotate: append a second secret, version 1 becomes current
    let rotated = KeyRing::derive(&[
        Secret::high_entropy(vec![42u8; 32]),
        Secret::high_entropy(vec![43u8; 32]),
    ])?;
    println!("✓ Ring rotated (current version {})", rotated.current().version());

    // The old envelope still opens, bytes untouched
    let reloaded = SealedField::from_parts(Envelope::from_bytes(&blob)?, sealed.token().copied());
    let opened = email.open(&reloaded, &rotated)?;
    assert_eq!(value, opened);
    println!("✓ Pre-rotation envelope still opens\n");

    // Equality lookups span both key epochs until records are reindexed
    let tokens = email.lookup_tokens(&value, &rotated)?;
    println!("Lookup tokens ({} epochs):", tokens.len());
    for token in &tokens {
        println!("  {token}");
    }
    assert!(tokens.contains(sealed.token().expect("searchable field emits a token")));
    println!("✓ Old token still matches\n");

    println!("=============================");
    println!("All operations successful");

    Ok(())
}
