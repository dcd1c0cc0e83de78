//! Service-level tests: named services over JSON bodies, as the CLI and
//! HTTP host call them

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use crosswalk::service::run;
use crosswalk::{Service, ServiceError, ServiceRequest};
use serde_json::{json, Value};

fn call(service: &str, body: Value, params: &[(&str, &str)]) -> Value {
    let service: Service = service.parse().unwrap();
    let request = params.iter().fold(ServiceRequest::new(body.to_string()), |req, (k, v)| {
        req.with_param(*k, *v)
    });
    serde_json::from_str(&run(service, &request).unwrap()).unwrap()
}

#[test]
fn test_unparseable_body_for_every_service() {
    for service in Service::ALL {
        let err = run(service, &ServiceRequest::new("this is not json")).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidBody(_)), "{}", service);
        assert_eq!(err.to_string(), "Unable to parse body as JSON");
    }
}

#[test]
fn test_oai_to_dpla_with_contributor() {
    let contributor =
        STANDARD.encode(r#"{"@id": "http://dp.la/api/contributor/kdl", "name": "KDL"}"#);
    let request =
        ServiceRequest::new(r#"{"id": "kdl--1", "date": "1928"}"#).with_contributor(contributor);
    let out: Value = serde_json::from_str(&run(Service::OaiToDpla, &request).unwrap()).unwrap();

    assert_eq!(out["provider"]["name"], json!("KDL"));
    assert_eq!(out["aggregatedCHO"]["temporal"], json!([{"start": "1928", "end": "1928"}]));
}

#[test]
fn test_undecodable_contributor_is_ignored() {
    let request = ServiceRequest::new(r#"{"title": "T"}"#).with_contributor("!!not base64!!");
    let out: Value = serde_json::from_str(&run(Service::OaiToDpla, &request).unwrap()).unwrap();

    assert!(out.get("provider").is_none());
    assert_eq!(out["aggregatedCHO"]["title"], json!("T"));
}

#[test]
fn test_copy_rights_service() {
    let input = json!({
        "key1": "value1",
        "aggregatedCHO": {"key1": "value1", "key2": "value2"},
        "key2": "value2"
    });
    assert_eq!(call("copy_rights", input.clone(), &[]), input);

    let out = call(
        "copy_rights",
        json!({
            "isShownAt": {"key1": "value1", "rights": ""},
            "aggregatedCHO": {"rights": "These are the rights"}
        }),
        &[],
    );
    assert_eq!(out["isShownAt"]["rights"], json!("These are the rights"));
}

#[test]
fn test_enrich_format_service() {
    let out = call(
        "enrich-format",
        json!({"format": ["Still Images", "image/JPEG", "audio", "Images"]}),
        &[("prop", "format"), ("alternate", "TBD_physicalformat")],
    );
    assert_eq!(out["format"], json!(["image/jpeg", "audio"]));
    assert_eq!(out["TBD_physicalformat"], json!(["Still Images", "Images"]));

    let out = call(
        "enrich-format",
        json!({"format": "image/JPEG"}),
        &[("prop", "format"), ("alternate", "TBD_physicalformat")],
    );
    assert_eq!(out, json!({"format": "image/jpeg"}));
}

#[test]
fn test_enrich_type_and_subject_services() {
    let out = call("enrich-type", json!({"type": ["Still Images", "Text"]}), &[("prop", "type")]);
    assert_eq!(out["type"], json!(["image", "text"]));

    let out = call(
        "enrich-subject",
        json!({"subject": ["Cats", "Dogs -- Mean", "Mice."]}),
        &[("prop", "subject")],
    );
    assert_eq!(
        out["subject"],
        json!([{"name": "Cats"}, {"name": "Dogs--Mean"}, {"name": "Mice"}])
    );
}

#[test]
fn test_shred_services() {
    let input = json!({"id": "999", "prop1": "lets,go,bluejays"});
    let out = call("shred", input, &[("prop", "prop1")]);
    assert_eq!(out, json!({"id": "999", "prop1": ["lets", "go", "bluejays"]}));

    let out = call("shred", json!({"p": "a,d,f ,, g"}), &[("prop", "p"), ("delim", " ")]);
    assert_eq!(out, json!({"p": ["a,d,f", ",,", "g"]}));

    let out = call(
        "shred",
        json!({"id": "999", "prop1": ["lets", "go", "bluejays"]}),
        &[("action", "unshred"), ("prop", "prop1")],
    );
    assert_eq!(out, json!({"id": "999", "prop1": "lets,go,bluejays"}));

    let input = json!({"id": "999", "prop1": "lets,go,bluejays"});
    assert_eq!(call("shred", input.clone(), &[("prop", "prop9")]), input);
}

#[test]
fn test_move_dates_service() {
    let input = json!({"aggregatedCHO": {"spatial": [{"name": "Frankfort"}, {"name": "(1863)"}]}});

    // No prop: logged, document untouched
    assert_eq!(call("move_dates_to_temporal", input.clone(), &[]), input);

    let out = call("move_dates_to_temporal", input, &[("prop", "aggregatedCHO/spatial")]);
    assert_eq!(out["aggregatedCHO"]["spatial"], json!([{"name": "Frankfort"}]));
    assert_eq!(out["aggregatedCHO"]["temporal"], json!([{"name": "1863"}]));
}

#[test]
fn test_move_dates_word_anchor_option() {
    let input = json!({"spatial": [{"name": "1850s"}]});

    let out = call("move_dates_to_temporal", input.clone(), &[("prop", "spatial")]);
    assert!(out.get("spatial").is_none());

    let params = [("prop", "spatial"), ("anchor", "word")];
    let out = call("move_dates_to_temporal", input.clone(), &params);
    assert_eq!(out, input);
}

#[test]
fn test_identify_object_service() {
    let body = json!({"aggregatedCHO": {"relation": "http://x/img/p.jpg", "rights": "Public"}});

    let out = call("kentucky_identify_object", body.clone(), &[("download", "False")]);
    assert_eq!(out["object"]["@id"], json!("http://x/img/p_tb.jpg"));
    assert_eq!(out["object"]["rights"], json!("Public"));
    assert_eq!(out["admin"]["object_status"], json!("ignore"));

    let out = call("identify_object", body, &[]);
    assert_eq!(out["admin"]["object_status"], json!("pending"));
}

#[test]
fn test_pipeline_convert_then_enrich() {
    let record = json!({
        "id": "kdl--9",
        "handle": "http://kdl.kyvl.org/catalog/9",
        "format": "Image/JPG",
        "rights": "Contact KDL",
        "subject": "Horses -- Kentucky."
    });

    let envelope = call("oai-to-dpla", record, &[]);
    let envelope = call("enrich-format", envelope, &[]);
    let envelope = call("copy_rights", envelope, &[]);
    let envelope = call("enrich-subject", envelope, &[]);

    assert_eq!(
        envelope["isShownAt"],
        json!({
            "@id": "http://kdl.kyvl.org/catalog/9",
            "format": "image/jpeg",
            "rights": "Contact KDL"
        })
    );
    assert_eq!(envelope["aggregatedCHO"]["subject"], json!([{"name": "Horses--Kentucky"}]));
}
