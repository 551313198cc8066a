//! SOAP 1.1 calls over the REST transport
//!
//! Envelopes are built as text with escaped parameter values, POSTed to the
//! service endpoint and answered with the first element inside `Body`.
//! Faults are reported as [`ServiceError::SoapFault`], whether the server
//! sends them with a 200 or a 500 status.

use crate::error::{Result, ServiceError};
use crate::parse::XmlElement;
use crate::transport::rest::RestClient;
use bioservices_common::ResponseFormat;
use quick_xml::escape::escape;

const ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Client for an RPC-style SOAP endpoint
#[derive(Debug, Clone)]
pub struct SoapClient {
    rest: RestClient,
    namespace: String,
}

impl SoapClient {
    /// `rest` points at the endpoint; `namespace` is the contract's target
    /// namespace
    pub fn new(rest: RestClient, namespace: impl Into<String>) -> Self {
        Self {
            rest,
            namespace: namespace.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        self.rest.base_url()
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    /// SOAP envelope for `method`; repeated names encode list parameters
    pub fn envelope(&self, method: &str, params: &[(&str, &str)]) -> String {
        let mut body = String::new();
        for (name, value) in params {
            body.push_str(&format!("<ns:{name}>{}</ns:{name}>", escape(*value)));
        }

        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <soapenv:Envelope xmlns:soapenv=\"{ENVELOPE_NS}\" xmlns:ns=\"{}\">\
             <soapenv:Header/>\
             <soapenv:Body><ns:{method}>{body}</ns:{method}></soapenv:Body>\
             </soapenv:Envelope>",
            escape(self.namespace.as_str()),
        )
    }

    /// Invoke `method` and return the response element
    pub async fn call(&self, method: &str, params: &[(&str, &str)]) -> Result<XmlElement> {
        let envelope = self.envelope(method, params);
        let action = format!("\"{}#{}\"", self.namespace, method);
        tracing::debug!(endpoint = %self.endpoint(), method, "Calling SOAP method");

        let response = self
            .rest
            .post_body_any_status(
                "",
                envelope,
                "text/xml; charset=utf-8",
                &[("SOAPAction", action.as_str())],
                ResponseFormat::Xml,
            )
            .await?;

        let status = response.status();
        let document = match XmlElement::from_bytes(response.body()) {
            Ok(document) => document,
            Err(_) if !status.is_success() => {
                return Err(ServiceError::http(response.url(), status.as_u16(), response.body()));
            },
            Err(e) => return Err(e),
        };
        if let Some(fault) = fault(response.url(), &document) {
            return Err(fault);
        }
        if !status.is_success() {
            return Err(ServiceError::http(response.url(), status.as_u16(), response.body()));
        }

        document
            .find("Body")
            .and_then(|body| body.children().first())
            .cloned()
            .ok_or_else(|| {
                ServiceError::parse(format!(
                    "SOAP response from {} has no Body content",
                    response.url()
                ))
            })
    }
}

fn fault(url: &str, document: &XmlElement) -> Option<ServiceError> {
    let fault = document.find("Fault")?;
    Some(ServiceError::SoapFault {
        url: url.to_string(),
        code: fault.child_text("faultcode").unwrap_or_default().to_string(),
        message: fault.child_text("faultstring").unwrap_or_default().to_string(),
    })
}
