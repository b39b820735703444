//! Integration tests for the moat-core protocol contract.
//!
//! These tests exercise the request payloads and the response codec
//! together through the public API: the exact bodies the server must
//! receive, the parsing of its success envelopes into domain entities,
//! and the preference for server-supplied error details when an exchange
//! fails.

use serde_json::json;

use moat_core::protocol::codec::{error_detail, parse_check_response, parse_fetch_response};
use moat_core::protocol::messages::{Envelope, SolutionAnswer, TransportsQuery};
use moat_core::{Challenge, MoatError};

/// The fetch request body must match the protocol table byte-for-byte.
#[test]
fn test_fetch_request_body_is_exact() {
    let body = serde_json::to_string(&Envelope::single(TransportsQuery::obfs4()))
        .expect("serialize must succeed");

    assert_eq!(
        body,
        r#"{"data":[{"version":"0.1.0","type":"client-transports","supported":["obfs4"]}]}"#
    );
}

/// The check request body must embed token and solution verbatim, with JSON
/// string encoding as the only transformation.
#[test]
fn test_check_request_embeds_token_and_solution_verbatim() {
    let body = serde_json::to_value(Envelope::single(SolutionAnswer::obfs4(
        "JHh+pRFi6ZxM0aZ6",
        "tricky solution",
    )))
    .expect("serialize must succeed");

    assert_eq!(body["data"][0]["challenge"], "JHh+pRFi6ZxM0aZ6");
    assert_eq!(body["data"][0]["solution"], "tricky solution");
    assert_eq!(body["data"][0]["id"], "2");
    assert_eq!(body["data"][0]["type"], "moat-solution");
    assert_eq!(body["data"][0]["transport"], "obfs4");
    assert_eq!(body["data"][0]["qrcode"], "false");
}

/// A captcha response round-trips into a Challenge with the decoded bytes.
#[test]
fn test_fetch_response_yields_decoded_challenge() {
    // "AAECAwQ=" is base64 for the five bytes 0,1,2,3,4.
    let body = json!({"data":[{"challenge":"abc","image":"AAECAwQ="}]});

    let challenge = parse_fetch_response(&body).expect("parse must succeed");

    assert_eq!(challenge, Challenge::new("abc", vec![0, 1, 2, 3, 4]));
}

/// Bridge lines come back newline-joined in server order, one trailing
/// newline per line.
#[test]
fn test_check_response_storage_form() {
    let body = json!({"data":[{"bridges":["bridge1 1.2.3.4:443","bridge2 5.6.7.8:443"]}]});

    let bridges = parse_check_response(&body).expect("parse must succeed");

    assert_eq!(
        bridges.to_storage_string(),
        "bridge1 1.2.3.4:443\nbridge2 5.6.7.8:443\n"
    );
    assert_eq!(bridges.lines().len(), 2);
}

/// A server error envelope wins over whatever the raw cause was.
#[test]
fn test_server_detail_is_preferred_verbatim() {
    let body = json!({"errors":[{"detail":"wrong solution"}]});

    let err = MoatError::classify(Some(&body), "HTTP 419 Page Expired");

    assert_eq!(err.message(), "wrong solution");
}

/// Without a parseable error envelope the raw cause's message is surfaced.
#[test]
fn test_transport_cause_is_surfaced_without_envelope() {
    let err = MoatError::classify(None, "connection refused");

    assert_eq!(err.message(), "connection refused");
}

/// A success envelope with surplus data elements parses from the first.
#[test]
fn test_extra_data_elements_are_ignored() {
    let body = json!({"data":[
        {"bridges":["only these"]},
        {"bridges":["never read"]}
    ]});

    let bridges = parse_check_response(&body).expect("parse must succeed");

    assert_eq!(bridges.to_storage_string(), "only these\n");
}

/// An error envelope with no detail field is not classified as a server
/// error; the fallback cause is used instead.
#[test]
fn test_detailless_error_envelope_falls_back() {
    let body = json!({"errors":[{}]});

    assert_eq!(error_detail(&body), None);
    let err = MoatError::classify(Some(&body), "malformed response envelope");
    assert_eq!(err.message(), "malformed response envelope");
}
