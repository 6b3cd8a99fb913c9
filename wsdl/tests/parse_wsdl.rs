use lather_wsdl::{
    error::Error,
    types::{Cardinality, TypeKind},
    TypeGraph,
};

const CAMPAIGN_WSDL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
                  xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
                  xmlns:xsd="http://www.w3.org/2001/XMLSchema"
                  xmlns:tns="https://api.example/svc/v201802"
                  targetNamespace="https://api.example/svc/v201802">
  <wsdl:types>
    <xsd:schema elementFormDefault="qualified"
                targetNamespace="https://api.example/svc/v201802">
      <xsd:complexType name="BiddingScheme" abstract="true">
        <xsd:sequence>
          <xsd:element name="schemeName" type="xsd:string" minOccurs="0"/>
        </xsd:sequence>
      </xsd:complexType>
      <xsd:complexType name="ManualCpcBiddingScheme">
        <xsd:complexContent>
          <xsd:extension base="tns:BiddingScheme">
            <xsd:sequence>
              <xsd:element name="enhancedCpcEnabled" type="xsd:boolean" minOccurs="0"/>
            </xsd:sequence>
          </xsd:extension>
        </xsd:complexContent>
      </xsd:complexType>
      <xsd:complexType name="TargetCpaBiddingScheme">
        <xsd:complexContent>
          <xsd:extension base="tns:BiddingScheme">
            <xsd:sequence>
              <xsd:element name="targetCpa" type="xsd:long" minOccurs="0" nillable="true"/>
            </xsd:sequence>
          </xsd:extension>
        </xsd:complexContent>
      </xsd:complexType>
      <xsd:simpleType name="CampaignStatus">
        <xsd:restriction base="xsd:string">
          <xsd:enumeration value="ENABLED"/>
          <xsd:enumeration value="PAUSED"/>
          <xsd:enumeration value="REMOVED"/>
        </xsd:restriction>
      </xsd:simpleType>
      <xsd:element name="get">
        <xsd:complexType>
          <xsd:sequence>
            <xsd:element name="fields" type="xsd:string" minOccurs="0" maxOccurs="unbounded"/>
          </xsd:sequence>
        </xsd:complexType>
      </xsd:element>
      <xsd:element name="getResponse">
        <xsd:complexType>
          <xsd:sequence>
            <xsd:element name="totalNumEntries" type="xsd:long" minOccurs="0"/>
          </xsd:sequence>
        </xsd:complexType>
      </xsd:element>
    </xsd:schema>
  </wsdl:types>
  <wsdl:message name="getRequest">
    <wsdl:part name="parameters" element="tns:get"/>
  </wsdl:message>
  <wsdl:message name="getResponse">
    <wsdl:part name="parameters" element="tns:getResponse"/>
  </wsdl:message>
  <wsdl:portType name="CampaignServiceInterface">
    <wsdl:operation name="get">
      <wsdl:documentation>Returns the list of campaigns.</wsdl:documentation>
      <wsdl:input message="tns:getRequest"/>
      <wsdl:output message="tns:getResponse"/>
    </wsdl:operation>
  </wsdl:portType>
  <wsdl:binding name="CampaignServiceSoapBinding" type="tns:CampaignServiceInterface">
    <soap:binding transport="http://schemas.xmlsoap.org/wsdl/soap/http" style="document"/>
    <wsdl:operation name="get">
      <soap:operation soapAction=""/>
      <wsdl:input><soap:body use="literal"/></wsdl:input>
      <wsdl:output><soap:body use="literal"/></wsdl:output>
    </wsdl:operation>
  </wsdl:binding>
  <wsdl:service name="CampaignService">
    <wsdl:port name="CampaignServicePort" binding="tns:CampaignServiceSoapBinding">
      <soap:address location="https://api.example/svc/v201802/CampaignService"/>
    </wsdl:port>
  </wsdl:service>
</wsdl:definitions>
"#;

fn write_fixture(name: &str, content: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("lather-{}-{}", std::process::id(), name));
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn parses_campaign_service() {
    let path = write_fixture("campaign.wsdl", CAMPAIGN_WSDL);
    let (definition, namespaces) = lather_wsdl::parse(path.to_str().unwrap()).unwrap();

    let graph = TypeGraph::build(&definition, &namespaces).unwrap();

    let scheme = definition
        .types
        .iter()
        .find(|ty| ty.name.name == "BiddingScheme")
        .unwrap();

    match &scheme.kind {
        TypeKind::Struct(st) => {
            assert!(st.is_abstract);
            assert_eq!(st.fields.len(), 1);
            assert_eq!(st.fields[0].cardinality, Cardinality::Optional);
        }
        other => panic!("unexpected kind {:?}", other),
    }

    let derived: Vec<_> = graph
        .derived_types(&scheme.name)
        .into_iter()
        .map(|ty| ty.name.name.as_str())
        .collect();
    assert_eq!(derived, vec!["ManualCpcBiddingScheme", "TargetCpaBiddingScheme"]);

    let target_cpa = graph.get(&derived_name(&definition, "TargetCpaBiddingScheme")).unwrap();
    match &target_cpa.kind {
        TypeKind::Struct(st) => {
            assert_eq!(st.base.as_ref(), Some(&scheme.name));
            assert!(st.fields[0].nillable);
        }
        other => panic!("unexpected kind {:?}", other),
    }

    let status = definition
        .types
        .iter()
        .find(|ty| ty.name.name == "CampaignStatus")
        .unwrap();
    match &status.kind {
        TypeKind::Enum(values) => assert_eq!(values, &["ENABLED", "PAUSED", "REMOVED"]),
        other => panic!("unexpected kind {:?}", other),
    }

    std::fs::remove_file(path).unwrap();
}

fn derived_name(
    definition: &lather_wsdl::Definition,
    local: &str,
) -> lather_wsdl::types::NamespacedName {
    definition
        .types
        .iter()
        .find(|ty| ty.name.name == local)
        .unwrap()
        .name
        .clone()
}

#[test]
fn hoists_anonymous_element_types() {
    let path = write_fixture("hoist.wsdl", CAMPAIGN_WSDL);
    let (definition, _) = lather_wsdl::parse(path.to_str().unwrap()).unwrap();

    let get = definition
        .types
        .iter()
        .find(|ty| ty.name.name == "get")
        .unwrap();

    match &get.kind {
        TypeKind::Struct(st) => {
            assert_eq!(st.fields.len(), 1);
            assert_eq!(st.fields[0].name.name, "fields");
            assert_eq!(st.fields[0].cardinality, Cardinality::Repeated);
        }
        other => panic!("unexpected kind {:?}", other),
    }

    std::fs::remove_file(path).unwrap();
}

#[test]
fn captures_binding_and_service_details() {
    let path = write_fixture("binding.wsdl", CAMPAIGN_WSDL);
    let (definition, _) = lather_wsdl::parse(path.to_str().unwrap()).unwrap();

    let binding = &definition.bindings[0];
    assert_eq!(binding.name.name, "CampaignServiceSoapBinding");
    assert_eq!(binding.transport, "http://schemas.xmlsoap.org/wsdl/soap/http");
    assert_eq!(binding.operations[0].action, "");
    assert_eq!(binding.operations[0].input_use.as_deref(), Some("literal"));
    lather_wsdl::validate_binding(binding).unwrap();

    let operation = &definition.port_types[0].operations[0];
    assert_eq!(
        operation.documentation.as_deref(),
        Some("Returns the list of campaigns.")
    );
    assert!(operation.input.is_some());
    assert!(operation.output.is_some());

    let port = &definition.services[0].ports[0];
    assert_eq!(
        port.location,
        "https://api.example/svc/v201802/CampaignService"
    );

    std::fs::remove_file(path).unwrap();
}

#[test]
fn rejects_soap12_bindings() {
    let wsdl = CAMPAIGN_WSDL.replace(
        "xmlns:soap=\"http://schemas.xmlsoap.org/wsdl/soap/\"",
        "xmlns:soap=\"http://schemas.xmlsoap.org/wsdl/soap12/\"",
    );

    let path = write_fixture("soap12.wsdl", &wsdl);
    let result = lather_wsdl::parse(path.to_str().unwrap());

    assert!(matches!(result, Err(Error::Unsupported { .. })));

    std::fs::remove_file(path).unwrap();
}

#[test]
fn rejects_rpc_style_bindings() {
    let wsdl = CAMPAIGN_WSDL.replace("style=\"document\"", "style=\"rpc\"");

    let path = write_fixture("rpc.wsdl", &wsdl);
    let (definition, _) = lather_wsdl::parse(path.to_str().unwrap()).unwrap();

    assert!(matches!(
        lather_wsdl::validate_binding(&definition.bindings[0]),
        Err(Error::Unsupported { .. })
    ));

    std::fs::remove_file(path).unwrap();
}
