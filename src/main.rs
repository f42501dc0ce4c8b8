// Copyright 2024 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use appattest::config::Config;
use appattest::store::{CredentialRecord, ICredentialStore, MemoCredentialStore};
use appattest::token::base64::{decode_str, encode_key_id};
use appattest::token::Attestation;
use appattest::verify::AppAttest;
use clap::Parser;
use openssl::nid::Nid;
use openssl::x509::X509Ref;
use std::error::Error;
use std::fs;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
enum AppAttestCli {
    Attest(AttestArgs),
    Assert(AssertArgs),
    Inspect(InspectArgs),
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Verify the supplied attestation object and save the attested key \
    to a credential record")]
struct AttestArgs {
    #[arg(short, long, default_value = "config.json")]
    config: String,

    #[arg(short, long, default_value = "attestation.cbor")]
    attestation: String,

    /// file containing the challenge the server handed out
    #[arg(long, default_value = "challenge.bin")]
    challenge: String,

    /// key identifier reported by the device, base64-encoded
    #[arg(short, long)]
    key_id: String,

    #[arg(short, long, default_value = "record.json")]
    record: String,

    /// the attestation file contains base64 rather than raw CBOR
    #[arg(short, long)]
    base64: bool,
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Verify the supplied assertion against a credential record, and \
    store the advanced counter back into the record")]
struct AssertArgs {
    #[arg(short, long, default_value = "config.json")]
    config: String,

    #[arg(short, long, default_value = "assertion.cbor")]
    assertion: String,

    /// file containing the request payload the assertion covers
    #[arg(short, long, default_value = "payload.bin")]
    payload: String,

    #[arg(short, long, default_value = "record.json")]
    record: String,

    /// the assertion file contains base64 rather than raw CBOR
    #[arg(short, long)]
    base64: bool,
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Decode the supplied attestation object and print its contents \
    without verifying it")]
struct InspectArgs {
    #[arg(short, long, default_value = "attestation.cbor")]
    attestation: String,

    /// the attestation file contains base64 rather than raw CBOR
    #[arg(short, long)]
    base64: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let outcome = match AppAttestCli::parse() {
        AppAttestCli::Attest(args) => attest(&args)
            .map(|r| println!("verification successful, key-id: {}", r.key_id))
            .map_err(|e| eprintln!("verification failed: {e}")),

        AppAttestCli::Assert(args) => check_assertion(&args)
            .map(|n| println!("verification successful, counter: {n}"))
            .map_err(|e| eprintln!("verification failed: {e}")),

        AppAttestCli::Inspect(args) => inspect(&args)
            .map(|j| println!("{j}"))
            .map_err(|e| eprintln!("decoding failed: {e}")),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(()) => ExitCode::FAILURE,
    }
}

fn read_input(path: &str, base64: bool) -> Result<Vec<u8>, Box<dyn Error>> {
    let buf = fs::read(path)?;

    if base64 {
        return Ok(decode_str(std::str::from_utf8(&buf)?)?);
    }

    Ok(buf)
}

fn attest(args: &AttestArgs) -> Result<CredentialRecord, Box<dyn Error>> {
    let cfg = Config::load(&args.config)?;
    let anchor = cfg.trust_anchor()?;
    let v = AppAttest::with_trust_anchor(&cfg.team_id, &cfg.bundle_id, &anchor);

    let attestation = read_input(&args.attestation, args.base64)?;
    let challenge = fs::read(&args.challenge)?;

    let a = v.verify_attestation(&challenge, &args.key_id, &attestation, cfg.environment)?;

    let record = CredentialRecord::from_attestation(&a)?;
    fs::write(&args.record, serde_json::to_string_pretty(&record)?)?;

    Ok(record)
}

fn check_assertion(args: &AssertArgs) -> Result<u32, Box<dyn Error>> {
    let cfg = Config::load(&args.config)?;
    let anchor = cfg.trust_anchor()?;
    let v = AppAttest::with_trust_anchor(&cfg.team_id, &cfg.bundle_id, &anchor);

    let j = fs::read_to_string(&args.record)?;
    let record: CredentialRecord = serde_json::from_str(&j)?;
    let key_id = record.key_id.clone();

    let store = MemoCredentialStore::new();
    store.insert(record)?;

    let assertion = read_input(&args.assertion, args.base64)?;
    let payload = fs::read(&args.payload)?;

    let n = v.verify_assertion_for(&store, &key_id, &assertion, &payload)?;

    if let Some(updated) = store.lookup(&key_id)? {
        fs::write(&args.record, serde_json::to_string_pretty(&updated)?)?;
    }

    Ok(n)
}

fn common_name(cert: &X509Ref) -> String {
    cert.subject_name()
        .entries_by_nid(Nid::COMMONNAME)
        .next()
        .and_then(|e| e.data().as_utf8().ok())
        .map(|s| s.to_string())
        .unwrap_or_default()
}

fn inspect(args: &InspectArgs) -> Result<String, Box<dyn Error>> {
    let buf = read_input(&args.attestation, args.base64)?;

    let a = Attestation::decode(&buf)?;

    let j = serde_json::json!({
        "format": a.format,
        "environment": a.environment(),
        "rp-id-hash": hex::encode(a.auth_data.rp_id_hash),
        "flags": a.auth_data.flags,
        "sign-count": a.auth_data.sign_count,
        "key-id": encode_key_id(a.credential_id()),
        "credential-certificate": common_name(&a.statement.credential_certificate),
        "intermediate-certificate": common_name(&a.statement.intermediate_certificate),
        "receipt-length": a.statement.receipt.len(),
    });

    Ok(serde_json::to_string_pretty(&j)?)
}
