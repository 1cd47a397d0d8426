// Identity helper commands

use anyhow::{bail, Context, Result};
use rolmanager_authorization::WellKnownRole;
use rolmanager_core::{Address, OperationId, RoleId, Salt};
use rolmanager_engine::{Call, Operation};

/// Resolve a role by well-known name, falling back to the digest of `name`
pub fn role_id(name: &str) -> RoleId {
    match name.parse::<WellKnownRole>() {
        Ok(role) => role.id(),
        Err(_) => RoleId::from_name(name),
    }
}

/// Parse an address given either as `0x` hex or as a label
pub fn parse_address(input: &str) -> Result<Address> {
    if input.starts_with("0x") {
        input
            .parse()
            .with_context(|| format!("invalid address {input}"))
    } else {
        Ok(Address::from_label(input))
    }
}

/// Payload bytes: `0x` hex or the UTF-8 text itself
pub fn parse_payload(input: &str) -> Result<Vec<u8>> {
    match input.strip_prefix("0x") {
        Some(digits) => hex::decode(digits).with_context(|| format!("invalid payload {input}")),
        None => Ok(input.as_bytes().to_vec()),
    }
}

/// Build the operation described by parallel target/payload lists
pub fn build_operation(
    targets: &[String],
    payloads: &[String],
    predecessor: Option<&str>,
    salt: u64,
    batch: bool,
) -> Result<Operation> {
    if targets.len() != payloads.len() {
        bail!(
            "{} targets but {} payloads",
            targets.len(),
            payloads.len()
        );
    }
    let calls = targets
        .iter()
        .zip(payloads)
        .map(|(target, payload)| Ok(Call::new(parse_address(target)?, parse_payload(payload)?)))
        .collect::<Result<Vec<_>>>()?;
    let predecessor = predecessor
        .map(|p| p.parse::<OperationId>())
        .transpose()
        .context("invalid predecessor")?;
    let salt = Salt::from_u64(salt);

    match (batch, calls.as_slice()) {
        (false, [call]) => Ok(Operation::single(call.clone(), predecessor, salt)),
        (false, _) => bail!("a single operation takes exactly one call; pass --batch"),
        (true, _) => Ok(Operation::batch(calls, predecessor, salt)),
    }
}

/// Print the identifier of a role
pub fn handle_role_id(name: &str) -> Result<()> {
    let id = role_id(name);
    match WellKnownRole::from_id(&id) {
        Some(role) => println!("{} {}", id, role.name()),
        None => println!("{id}"),
    }
    Ok(())
}

/// Print the identity of an operation
pub fn handle_operation_id(
    targets: &[String],
    payloads: &[String],
    predecessor: Option<&str>,
    salt: u64,
    batch: bool,
) -> Result<()> {
    let operation = build_operation(targets, payloads, predecessor, salt, batch)?;
    println!("{}", operation.id());
    Ok(())
}
