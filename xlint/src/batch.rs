//! Streaming batch mode.
//!
//! Reads a stream of JSON records `{"raw": <base64 DER>, "validation": ...}`,
//! lints each certificate on a pool of worker threads fed through a bounded
//! channel, and writes one JSON line plus one process line per certificate.
//! Output order follows completion order, not input order.

use anyhow::{anyhow, Result};
use crossbeam_channel::bounded;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{BufReader, Read, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use xlint_lib::{CertificateInfo, Engine, LintConfig, ResultSet};

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub cert_threads: usize,
    pub channel_size: usize,
    pub fatal_parse_errors: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        BatchOptions {
            cert_threads: 1,
            channel_size: 1000,
            fatal_parse_errors: false,
        }
    }
}

/// Counters reported when the stream is exhausted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    pub records: usize,
    pub linted: usize,
    pub unparseable: usize,
}

#[derive(Debug, Deserialize)]
struct InputRecord {
    raw: String,
    #[serde(default)]
    validation: Option<Value>,
}

#[derive(Serialize)]
struct OutputRecord<'a> {
    raw: &'a str,
    parsed: &'a CertificateInfo,
    lint: &'a ResultSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    validation: Option<&'a Value>,
}

/// Validation annotation carried alongside a certificate.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Validation {
    #[serde(default)]
    pub nss: Option<NssValidation>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct NssValidation {
    pub valid: bool,
    pub was_valid: bool,
}

impl Validation {
    /// The NSS verdict, if the annotation has the expected shape.
    pub fn nss_from(value: &Value) -> Option<NssValidation> {
        Validation::deserialize(value).ok()?.nss
    }
}

/// Build the comma-separated process line for one certificate.
///
/// Issuer and subject have `", "` replaced by `":"` so the field count stays
/// fixed. Without a usable NSS annotation the line is empty.
pub fn process_line(
    cert: &CertificateInfo,
    results: &ResultSet,
    nss: Option<NssValidation>,
) -> String {
    let Some(nss) = nss else {
        return "\n".to_string();
    };
    let fields = [
        results.errors().len().to_string(),
        results.warnings().len().to_string(),
        nss.valid.to_string(),
        nss.was_valid.to_string(),
        cert.not_before.to_string(),
        cert.not_after.to_string(),
        cert.issuer_string().replace(", ", ":"),
        cert.subject_string().replace(", ", ":"),
        cert.fingerprint_sha256(),
        results.fatals().len().to_string(),
        results.errors().join(","),
        results.warnings().join(","),
    ];
    let mut line = fields.join(",");
    line.push('\n');
    line
}

struct Sinks<'w, J, P> {
    json: &'w mut J,
    process: &'w mut P,
}

/// Lint every record in `input`, writing to `json_out` and `process_out`.
///
/// Unparseable certificates are logged and skipped; with
/// `fatal_parse_errors` the first one stops the run and is returned as the
/// error. A malformed JSON stream ends reading at the point of corruption.
pub fn run<R, J, P>(
    input: R,
    json_out: &mut J,
    process_out: &mut P,
    engine: Engine<'_>,
    config: &LintConfig,
    opts: &BatchOptions,
) -> Result<BatchStats>
where
    R: Read + Send,
    J: Write + Send,
    P: Write + Send,
{
    let (tx, rx) = bounded::<InputRecord>(opts.channel_size.max(1));
    let sinks = Mutex::new(Sinks {
        json: json_out,
        process: process_out,
    });
    let abort = AtomicBool::new(false);
    let failure: Mutex<Option<anyhow::Error>> = Mutex::new(None);
    let records = AtomicUsize::new(0);
    let linted = AtomicUsize::new(0);
    let unparseable = AtomicUsize::new(0);

    let fail = |err: anyhow::Error| {
        abort.store(true, Ordering::SeqCst);
        if let Ok(mut slot) = failure.lock() {
            slot.get_or_insert(err);
        }
    };

    std::thread::scope(|s| {
        s.spawn(|| {
            tracing::info!("reading certificates");
            let stream = serde_json::Deserializer::from_reader(BufReader::new(input))
                .into_iter::<Value>();
            for value in stream {
                if abort.load(Ordering::SeqCst) {
                    break;
                }
                let value = match value {
                    Ok(v) => v,
                    Err(e) => {
                        tracing::error!(error = %e, "malformed input stream, stopping");
                        if opts.fatal_parse_errors {
                            fail(anyhow!("malformed input stream: {}", e));
                        }
                        break;
                    }
                };
                records.fetch_add(1, Ordering::Relaxed);
                match serde_json::from_value::<InputRecord>(value) {
                    Ok(record) => {
                        if tx.send(record).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        unparseable.fetch_add(1, Ordering::Relaxed);
                        tracing::info!(error = %e, "skipping record without raw certificate");
                        if opts.fatal_parse_errors {
                            fail(anyhow!("invalid input record: {}", e));
                            break;
                        }
                    }
                }
            }
            drop(tx);
        });

        for worker in 0..opts.cert_threads.max(1) {
            let rx = rx.clone();
            let sinks = &sinks;
            let fail = &fail;
            let (abort, linted, unparseable) = (&abort, &linted, &unparseable);
            s.spawn(move || {
                tracing::debug!(worker, "processing certificates");
                for record in rx.iter() {
                    if abort.load(Ordering::SeqCst) {
                        continue;
                    }
                    let cert = match xlint_lib::base64_to_der(&record.raw)
                        .and_then(|der| xlint_lib::parse_der(&der))
                    {
                        Ok(cert) => cert,
                        Err(e) => {
                            unparseable.fetch_add(1, Ordering::Relaxed);
                            if opts.fatal_parse_errors {
                                tracing::error!(error = %e, "could not parse certificate");
                                fail(anyhow!("could not parse certificate: {}", e));
                            } else {
                                tracing::info!(error = %e, "could not parse certificate");
                            }
                            continue;
                        }
                    };

                    let results = engine.run(&cert, config);
                    let nss = record.validation.as_ref().and_then(Validation::nss_from);
                    let line = process_line(&cert, &results, nss);
                    let raw = xlint_lib::der_to_base64(&cert.raw_der);
                    let output = OutputRecord {
                        raw: &raw,
                        parsed: &cert,
                        lint: &results,
                        validation: record.validation.as_ref(),
                    };
                    let json = match serde_json::to_string(&output) {
                        Ok(j) => j,
                        Err(e) => {
                            fail(anyhow!("could not serialize result: {}", e));
                            continue;
                        }
                    };

                    let written = match sinks.lock() {
                        Ok(mut guard) => guard
                            .process
                            .write_all(line.as_bytes())
                            .and_then(|()| writeln!(guard.json, "{}", json)),
                        Err(_) => {
                            fail(anyhow!("output lock poisoned"));
                            continue;
                        }
                    };
                    match written {
                        Ok(()) => {
                            linted.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(e) => fail(anyhow!("write failed: {}", e)),
                    }
                }
            });
        }
    });

    if let Some(err) = failure.into_inner().map_err(|_| anyhow!("failure slot poisoned"))? {
        return Err(err);
    }

    let mut sinks = sinks
        .into_inner()
        .map_err(|_| anyhow!("output lock poisoned"))?;
    sinks.json.flush()?;
    sinks.process.flush()?;

    let stats = BatchStats {
        records: records.into_inner(),
        linted: linted.into_inner(),
        unparseable: unparseable.into_inner(),
    };
    tracing::info!(
        records = stats.records,
        linted = stats.linted,
        unparseable = stats.unparseable,
        "batch complete"
    );
    Ok(stats)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use rcgen::{CertificateParams, DnType, KeyPair};
    use xlint_lib::Registry;

    fn cert_b64(cn: &str) -> String {
        let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
        params.distinguished_name = rcgen::DistinguishedName::new();
        params.distinguished_name.push(DnType::CommonName, cn);
        params
            .distinguished_name
            .push(DnType::OrganizationName, "Example Org");
        params.not_before = rcgen::date_time_ymd(2017, 1, 1);
        params.not_after = rcgen::date_time_ymd(2018, 1, 1);
        let key = KeyPair::generate().unwrap();
        let cert = params.self_signed(&key).unwrap();
        xlint_lib::der_to_base64(cert.der())
    }

    fn run_input(input: &str, opts: &BatchOptions) -> (Result<BatchStats>, String, String) {
        let registry = Registry::builtin().unwrap();
        let mut json = Vec::new();
        let mut process = Vec::new();
        let result = run(
            input.as_bytes(),
            &mut json,
            &mut process,
            Engine::new(&registry),
            &LintConfig::default(),
            opts,
        );
        (
            result,
            String::from_utf8(json).unwrap(),
            String::from_utf8(process).unwrap(),
        )
    }

    #[test]
    fn one_line_per_parsed_certificate() {
        let good = cert_b64(" leading.example");
        let input = format!(
            "{{\"raw\":\"{good}\",\"validation\":{{\"nss\":{{\"valid\":true,\"was_valid\":false}}}}}}\n\
             {{\"raw\":\"AAAA\"}}\n\
             {{\"raw\":\"{good}\"}}\n"
        );
        let opts = BatchOptions {
            cert_threads: 3,
            channel_size: 1,
            ..Default::default()
        };
        let (result, json, process) = run_input(&input, &opts);
        let stats = result.unwrap();
        assert_eq!(
            stats,
            BatchStats {
                records: 3,
                linted: 2,
                unparseable: 1
            }
        );

        let lines: Vec<Value> = json
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        for line in &lines {
            assert_eq!(line["raw"], Value::String(good.clone()));
            assert_eq!(
                line["lint"]["w_subject_dn_leading_whitespace"]["result"],
                "warn"
            );
            assert!(line["parsed"]["subject"].is_object());
        }
        assert_eq!(lines.iter().filter(|l| l.get("validation").is_some()).count(), 1);

        let mut process_lines: Vec<&str> = process.split('\n').collect();
        process_lines.pop();
        assert_eq!(process_lines.len(), 2);
        assert!(process_lines.contains(&""));
        let annotated = process_lines.iter().find(|l| !l.is_empty()).unwrap();
        assert!(annotated.starts_with("0,2,true,false,2017-01-01T00:00:00Z,"));
        assert!(annotated.contains("CN =  leading.example"));
        assert!(!annotated.contains(", "));
        assert!(annotated.ends_with(",w_issuer_dn_leading_whitespace,w_subject_dn_leading_whitespace"));
    }

    #[test]
    fn fatal_parse_errors_abort() {
        let opts = BatchOptions {
            fatal_parse_errors: true,
            ..Default::default()
        };
        let (result, _, _) = run_input("{\"raw\":\"bm90IGEgY2VydA==\"}\n", &opts);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("could not parse certificate"));
    }

    #[test]
    fn malformed_stream_stops_reading() {
        let good = cert_b64("ok.example");
        let input = format!("{{\"raw\":\"{good}\"}}\n{{not json\n{{\"raw\":\"{good}\"}}\n");
        let (result, json, _) = run_input(&input, &BatchOptions::default());
        assert_eq!(result.unwrap().linted, 1);
        assert_eq!(json.lines().count(), 1);
    }

    #[test]
    fn validation_shape_mismatch_counts_as_absent() {
        assert_eq!(Validation::nss_from(&serde_json::json!({"nss": {"valid": "yes"}})), None);
        assert_eq!(Validation::nss_from(&serde_json::json!([1, 2])), None);
        assert_eq!(Validation::nss_from(&serde_json::json!({})), None);
        assert_eq!(
            Validation::nss_from(&serde_json::json!({"nss": {"valid": false, "was_valid": true}})),
            Some(NssValidation {
                valid: false,
                was_valid: true
            })
        );
    }
}
