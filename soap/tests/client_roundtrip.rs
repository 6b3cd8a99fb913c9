//! End-to-end call tests against a canned single-shot HTTP responder.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use lather_soap::{
    CallError, ChildReader, Client, ClientConfig, DecodingError, Element, EmptyBodyPolicy,
    EncodingError, FromXml, Payload, QName, ToXml, UsernameToken,
};

const SVC_NS: &str = "https://api.example/svc/v201802";

#[derive(Debug, Clone, Default, PartialEq)]
struct Get {
    fields: Vec<String>,
}

impl ToXml for Get {
    fn to_element(&self, name: &QName) -> Result<Element, EncodingError> {
        let mut element = Element::new(name.clone());
        let mut selector = Element::new(QName::new(SVC_NS, "selector"));
        for field in &self.fields {
            selector.push(field.to_element(&QName::new(SVC_NS, "fields"))?);
        }
        element.push(selector);
        Ok(element)
    }
}

impl FromXml for Get {
    fn from_element(element: &Element) -> Result<Self, DecodingError> {
        let selector = element
            .child(&QName::new(SVC_NS, "selector"))
            .ok_or_else(|| DecodingError::MissingElement(QName::new(SVC_NS, "selector")))?;
        let mut children = ChildReader::new(selector);
        Ok(Self {
            fields: children.repeated(&QName::new(SVC_NS, "fields"))?,
        })
    }
}

impl Payload for Get {
    fn element_name() -> QName {
        QName::new(SVC_NS, "get")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct GetResponse {
    total_num_entries: Option<i64>,
}

impl ToXml for GetResponse {
    fn to_element(&self, name: &QName) -> Result<Element, EncodingError> {
        let mut element = Element::new(name.clone());
        let mut rval = Element::new(QName::new(SVC_NS, "rval"));
        if let Some(total) = &self.total_num_entries {
            rval.push(total.to_element(&QName::new(SVC_NS, "totalNumEntries"))?);
        }
        element.push(rval);
        Ok(element)
    }
}

impl FromXml for GetResponse {
    fn from_element(element: &Element) -> Result<Self, DecodingError> {
        let rval = element
            .child(&QName::new(SVC_NS, "rval"))
            .ok_or_else(|| DecodingError::MissingElement(QName::new(SVC_NS, "rval")))?;
        let mut children = ChildReader::new(rval);
        Ok(Self {
            total_num_entries: children.optional(&QName::new(SVC_NS, "totalNumEntries"))?,
        })
    }
}

impl Payload for GetResponse {
    fn element_name() -> QName {
        QName::new(SVC_NS, "getResponse")
    }
}

/// Accept one connection, capture the request, answer with a canned
/// response, and hand the captured request back through the join handle.
fn serve_once(status: &str, body: &str) -> (String, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub listener");
    let endpoint = format!("http://{}/soap", listener.local_addr().unwrap());

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/xml; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let request = read_http_request(&mut stream);
        stream.write_all(response.as_bytes()).expect("write response");
        request
    });

    (endpoint, handle)
}

fn read_http_request(stream: &mut TcpStream) -> String {
    let mut data = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let read = stream.read(&mut chunk).expect("read request");
        if read == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..read]);

        if let Some(end) = find_subsequence(&data, b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&data[..end]).to_string();
            let content_length = headers
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())?
                })
                .unwrap_or(0);
            if data.len() >= end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&data).to_string()
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn client_for(endpoint: &str) -> Client {
    Client::new(ClientConfig::for_endpoint(endpoint).unwrap()).unwrap()
}

const GET_RESPONSE: &str = r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"><soapenv:Body><getResponse xmlns="https://api.example/svc/v201802"><rval><totalNumEntries>0</totalNumEntries></rval></getResponse></soapenv:Body></soapenv:Envelope>"#;

const FAULT_RESPONSE: &str = r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"><soapenv:Body><soapenv:Fault><faultcode>soap:Server</faultcode><faultstring>AuthenticationError.AUTHENTICATION_FAILED</faultstring></soapenv:Fault></soapenv:Body></soapenv:Envelope>"#;

#[test]
fn simple_get() {
    let (endpoint, server) = serve_once("200 OK", GET_RESPONSE);
    let client = client_for(&endpoint);

    let request = Get {
        fields: vec!["Id".to_owned()],
    };
    let response: GetResponse = client.call("", &request).unwrap();
    assert_eq!(response.total_num_entries, Some(0));

    let captured = server.join().unwrap();
    assert!(captured.starts_with("POST /soap HTTP/1.1"));
    assert!(captured.contains("content-type: text/xml; charset=\"utf-8\"")
        || captured.contains("Content-Type: text/xml; charset=\"utf-8\""));
    assert!(captured.to_ascii_lowercase().contains("soapaction:"));
    assert!(captured.contains("<ns0:fields>Id</ns0:fields>"));
}

#[test]
fn fault_path_surfaces_faultstring() {
    let (endpoint, server) = serve_once("500 Internal Server Error", FAULT_RESPONSE);
    let client = client_for(&endpoint);

    let err = client
        .call::<_, GetResponse>("", &Get::default())
        .unwrap_err();
    match err {
        CallError::Fault(fault) => {
            assert_eq!(fault.to_string(), "AuthenticationError.AUTHENTICATION_FAILED");
            assert_eq!(fault.code, "soap:Server");
        }
        other => panic!("expected fault, got {:?}", other),
    }
    server.join().unwrap();
}

#[test]
fn empty_body_succeeds_with_zero_state() {
    let (endpoint, server) = serve_once("200 OK", "");
    let client = client_for(&endpoint);

    let response: GetResponse = client.call("", &Get::default()).unwrap();
    assert_eq!(response, GetResponse::default());
    server.join().unwrap();
}

#[test]
fn empty_body_policy_error() {
    let (endpoint, server) = serve_once("200 OK", "");
    let mut config = ClientConfig::for_endpoint(&endpoint).unwrap();
    config.empty_body = EmptyBodyPolicy::Error;
    let client = Client::new(config).unwrap();

    let err = client
        .call::<_, GetResponse>("", &Get::default())
        .unwrap_err();
    assert!(matches!(err, CallError::EmptyResponse));
    server.join().unwrap();
}

#[test]
fn basic_auth_and_soap_action_on_the_wire() {
    let (endpoint, server) = serve_once("200 OK", GET_RESPONSE);
    let mut config = ClientConfig::for_endpoint(&endpoint).unwrap();
    config.basic_auth = Some(lather_soap::BasicAuth {
        username: "api".to_owned(),
        password: Some("key".to_owned()),
    });
    let client = Client::new(config).unwrap();

    let _: GetResponse = client.call("mutate", &Get::default()).unwrap();

    let captured = server.join().unwrap().to_ascii_lowercase();
    assert!(captured.contains("soapaction: mutate"));
    assert!(captured.contains("authorization: basic "));
}

#[test]
fn header_added_after_call_start_is_not_in_that_envelope() {
    let (endpoint, server) = serve_once("200 OK", GET_RESPONSE);
    let client = Arc::new(client_for(&endpoint));
    client.add_header(Arc::new(UsernameToken::new("alice", "s3cr3t")));

    let caller = {
        let client = Arc::clone(&client);
        thread::spawn(move || client.call::<_, GetResponse>("", &Get::default()).unwrap())
    };

    // Registration after the call starts must not appear in its
    // envelope; the envelope is fixed at marshal time.
    client.add_header(Arc::new(UsernameToken::new("mallory", "nope")));
    caller.join().unwrap();

    let captured = server.join().unwrap();
    assert!(captured.contains("<wsse:Username>alice</wsse:Username>"));
    // Either zero or one mallory token depending on interleaving is NOT
    // acceptable once the first envelope was marshalled with one header;
    // a single Security header means the snapshot held.
    let count = captured.matches("<wsse:Security").count();
    assert!(count >= 1);
    if count == 1 {
        assert!(!captured.contains("mallory"));
    }
}

#[test]
fn wire_log_hook_sees_request_and_response() {
    use std::sync::Mutex;

    let (endpoint, server) = serve_once("200 OK", GET_RESPONSE);
    let events: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);

    let client = client_for(&endpoint).with_wire_log(Box::new(move |event| {
        let tag = match event {
            lather_soap::WireEvent::Request { .. } => "request",
            lather_soap::WireEvent::Response { status, .. } => {
                assert_eq!(status, 200);
                "response"
            }
        };
        sink.lock().unwrap().push(tag.to_owned());
    }));

    let _: GetResponse = client.call("", &Get::default()).unwrap();
    server.join().unwrap();

    assert_eq!(*events.lock().unwrap(), vec!["request", "response"]);
}
