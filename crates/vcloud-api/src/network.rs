// vApp network configuration endpoints
//
// Resolves org → VDC → vApp by name, reads a vApp's NetworkConfigSection,
// and writes it back with one network added or removed. The section is
// edited as text (byte ranges reported by the parser), so every element
// the caller did not touch is sent back exactly as the cell returned it.

use std::fmt;
use std::net::Ipv4Addr;

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use tracing::debug;
use url::Url;

use crate::client::VcdClient;
use crate::error::Error;
use crate::models::{EntityRef, Task};
use crate::xml::{self, VCLOUD_NS, VcdNode, find_link};

pub const VDC_MEDIA_TYPE: &str = "application/vnd.vmware.vcloud.vdc+xml";
pub const VAPP_MEDIA_TYPE: &str = "application/vnd.vmware.vcloud.vApp+xml";
pub const NETWORK_CONFIG_SECTION_MEDIA_TYPE: &str =
    "application/vnd.vmware.vcloud.networkConfigSection+xml";

// ── VDC ──────────────────────────────────────────────────────────────

/// A virtual data center with the entities the network module needs.
#[derive(Debug, Clone)]
pub struct Vdc {
    pub name: String,
    pub href: String,
    /// `ResourceEntity` children of type vApp.
    pub vapps: Vec<EntityRef>,
    /// `AvailableNetworks/Network` (org VDC networks).
    pub networks: Vec<EntityRef>,
}

impl Vdc {
    pub fn vapp(&self, name: &str) -> Option<&EntityRef> {
        self.vapps.iter().find(|v| v.name == name)
    }

    pub fn network(&self, name: &str) -> Option<&EntityRef> {
        self.networks.iter().find(|n| n.name == name)
    }
}

// ── Fence mode ───────────────────────────────────────────────────────

/// How a vApp network connects to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FenceMode {
    #[default]
    Bridged,
    Isolated,
    NatRouted,
}

impl FenceMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bridged => "bridged",
            Self::Isolated => "isolated",
            Self::NatRouted => "natRouted",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "bridged" => Some(Self::Bridged),
            "isolated" => Some(Self::Isolated),
            "natRouted" => Some(Self::NatRouted),
            _ => None,
        }
    }
}

impl fmt::Display for FenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── NetworkConfig builder ────────────────────────────────────────────

/// An `<IpScope>` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpScope {
    pub gateway: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub dns1: Option<String>,
    pub dns2: Option<String>,
    pub dns_suffix: Option<String>,
    /// Inclusive static pool `(start, end)`.
    pub ip_range: Option<(String, String)>,
}

/// A new `<NetworkConfig>` element for a vApp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub name: String,
    pub fence_mode: FenceMode,
    pub ip_scope: Option<IpScope>,
    pub parent_network_href: Option<String>,
    pub firewall_enabled: bool,
    pub nat_enabled: bool,
}

impl NetworkConfig {
    /// Serialize as a self-contained element carrying its own default
    /// namespace, so it can be spliced into any section body.
    pub fn to_xml(&self) -> Result<String, Error> {
        let mut out = XmlOut::new();

        out.start(
            "NetworkConfig",
            &[("xmlns", VCLOUD_NS), ("networkName", &self.name)],
        )?;
        out.start("Configuration", &[])?;

        if let Some(scope) = &self.ip_scope {
            out.start("IpScopes", &[])?;
            out.start("IpScope", &[])?;
            out.text_element("IsInherited", "false")?;
            out.text_element("Gateway", &scope.gateway.to_string())?;
            out.text_element("Netmask", &scope.netmask.to_string())?;
            for (tag, value) in [
                ("Dns1", &scope.dns1),
                ("Dns2", &scope.dns2),
                ("DnsSuffix", &scope.dns_suffix),
            ] {
                if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                    out.text_element(tag, v)?;
                }
            }
            if let Some((start, end)) = &scope.ip_range {
                out.start("IpRanges", &[])?;
                out.start("IpRange", &[])?;
                out.text_element("StartAddress", start)?;
                out.text_element("EndAddress", end)?;
                out.end("IpRange")?;
                out.end("IpRanges")?;
            }
            out.end("IpScope")?;
            out.end("IpScopes")?;
        }

        if let Some(href) = &self.parent_network_href {
            out.empty("ParentNetwork", &[("href", href)])?;
        }

        out.text_element("FenceMode", self.fence_mode.as_str())?;

        out.start("Features", &[])?;
        if !self.firewall_enabled {
            out.start("FirewallService", &[])?;
            out.text_element("IsEnabled", "false")?;
            out.end("FirewallService")?;
        }
        if !self.nat_enabled {
            out.start("NatService", &[])?;
            out.text_element("IsEnabled", "false")?;
            out.end("NatService")?;
        }
        out.end("Features")?;

        out.end("Configuration")?;
        out.end("NetworkConfig")?;
        out.finish()
    }
}

/// Thin event writer over `quick_xml::Writer`.
struct XmlOut {
    writer: Writer<Vec<u8>>,
}

impl XmlOut {
    fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    fn write(&mut self, element: &str, event: Event<'_>) -> Result<(), Error> {
        self.writer
            .write_event(event)
            .map_err(|source| Error::XmlWrite {
                element: element.to_owned(),
                source,
            })
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), Error> {
        let start = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.write(name, Event::Start(start))
    }

    fn end(&mut self, name: &str) -> Result<(), Error> {
        self.write(name, Event::End(BytesEnd::new(name)))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), Error> {
        let elem = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.write(name, Event::Empty(elem))
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<(), Error> {
        self.start(name, &[])?;
        self.write(name, Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn finish(self) -> Result<String, Error> {
        String::from_utf8(self.writer.into_inner()).map_err(|e| Error::XmlWrite {
            element: "NetworkConfig".into(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })
    }
}

// ── NetworkConfigSection ─────────────────────────────────────────────

/// A vApp's `NetworkConfigSection` as returned by the cell.
#[derive(Debug, Clone)]
pub struct NetworkConfigSection {
    body: String,
    edit_href: String,
    network_names: Vec<String>,
}

impl NetworkConfigSection {
    pub fn parse(body: String) -> Result<Self, Error> {
        let (edit_href, network_names) = {
            let doc = xml::parse(&body)?;
            let root = doc.root_element();
            if !root.is_vcd("NetworkConfigSection") {
                return Err(Error::MissingElement {
                    element: "NetworkConfigSection",
                    context: "network config section response".into(),
                });
            }
            let edit_href = find_link(root, "edit", Some(NETWORK_CONFIG_SECTION_MEDIA_TYPE))
                .or_else(|| find_link(root, "edit", None))
                .and_then(|l| l.attribute("href"))
                .ok_or_else(|| Error::MissingElement {
                    element: "Link",
                    context: "NetworkConfigSection (rel=edit)".into(),
                })?
                .to_owned();
            let names = root
                .vcd_children("NetworkConfig")
                .filter_map(|n| n.attribute("networkName"))
                .map(str::to_owned)
                .collect();
            (edit_href, names)
        };

        Ok(Self {
            body,
            edit_href,
            network_names,
        })
    }

    pub fn edit_href(&self) -> &str {
        &self.edit_href
    }

    pub fn network_names(&self) -> &[String] {
        &self.network_names
    }

    pub fn contains(&self, network: &str) -> bool {
        self.network_names.iter().any(|n| n == network)
    }

    /// Section body with every `NetworkConfig` named `network` removed.
    pub fn without_network(&self, network: &str) -> Result<String, Error> {
        let doc = xml::parse(&self.body)?;
        let mut ranges: Vec<_> = doc
            .root_element()
            .vcd_children("NetworkConfig")
            .filter(|n| n.attribute("networkName") == Some(network))
            .map(|n| n.range())
            .collect();
        ranges.sort_by_key(|r| std::cmp::Reverse(r.start));

        let mut edited = self.body.clone();
        for range in ranges {
            edited.replace_range(range, "");
        }
        Ok(edited)
    }

    /// Section body with `fragment` appended as the last child element.
    pub fn with_network(&self, fragment: &str) -> Result<String, Error> {
        let doc = xml::parse(&self.body)?;
        let root = doc.root_element();
        let range = root.range();
        let closing = self.body[range.start..range.end]
            .rfind("</")
            .map(|offset| range.start + offset)
            .ok_or_else(|| Error::MissingElement {
                element: "NetworkConfigSection",
                context: "closing tag".into(),
            })?;

        let mut edited = String::with_capacity(self.body.len() + fragment.len());
        edited.push_str(&self.body[..closing]);
        edited.push_str(fragment);
        edited.push_str(&self.body[closing..]);
        Ok(edited)
    }
}

// ── Endpoints ────────────────────────────────────────────────────────

impl VcdClient {
    /// Resolve an org by name from `GET /api/org`.
    pub async fn find_org(&self, name: &str) -> Result<EntityRef, Error> {
        let url = self.api_url("org")?;
        let body = self.get_xml(&url).await?;
        let doc = xml::parse(&body)?;

        doc.root_element()
            .vcd_descendants("Org")
            .find(|o| o.attribute("name") == Some(name))
            .map(|o| EntityRef::from_node("Org", o))
            .transpose()?
            .ok_or_else(|| Error::NotFound {
                kind: "Org",
                name: name.into(),
            })
    }

    /// Resolve a VDC by name within an org and load its contents.
    pub async fn find_vdc(&self, org: &EntityRef, name: &str) -> Result<Vdc, Error> {
        let org_body = self.get_xml(&Url::parse(&org.href)?).await?;
        let vdc_href = {
            let doc = xml::parse(&org_body)?;
            doc.root_element()
                .vcd_children("Link")
                .find(|l| {
                    l.attribute("type") == Some(VDC_MEDIA_TYPE) && l.attribute("name") == Some(name)
                })
                .and_then(|l| l.attribute("href"))
                .map(str::to_owned)
                .ok_or_else(|| Error::NotFound {
                    kind: "VDC",
                    name: name.into(),
                })?
        };

        debug!(vdc = name, href = %vdc_href, "loading VDC");
        let body = self.get_xml(&Url::parse(&vdc_href)?).await?;
        let doc = xml::parse(&body)?;
        let root = doc.root_element();

        let vapps = root
            .vcd_descendants("ResourceEntity")
            .filter(|e| e.attribute("type") == Some(VAPP_MEDIA_TYPE))
            .map(|e| EntityRef::from_node("ResourceEntity", e))
            .collect::<Result<Vec<_>, _>>()?;
        let networks = root
            .vcd_child("AvailableNetworks")
            .map(|n| {
                n.vcd_children("Network")
                    .map(|e| EntityRef::from_node("Network", e))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();

        Ok(Vdc {
            name: name.into(),
            href: vdc_href,
            vapps,
            networks,
        })
    }

    /// Fetch a vApp's `NetworkConfigSection` as a standalone document.
    pub async fn get_network_config_section(
        &self,
        vapp_href: &str,
    ) -> Result<NetworkConfigSection, Error> {
        let vapp_body = self.get_xml(&Url::parse(vapp_href)?).await?;
        let section_href = {
            let doc = xml::parse(&vapp_body)?;
            doc.root_element()
                .first_vcd("NetworkConfigSection")
                .ok_or_else(|| Error::MissingElement {
                    element: "NetworkConfigSection",
                    context: vapp_href.into(),
                })?
                .required_attr("NetworkConfigSection", "href")?
                .to_owned()
        };

        let body = self.get_xml(&Url::parse(&section_href)?).await?;
        NetworkConfigSection::parse(body)
    }

    /// PUT an edited section back through its `rel="edit"` link.
    pub async fn update_network_config_section(
        &self,
        section: &NetworkConfigSection,
        body: String,
    ) -> Result<Task, Error> {
        let url = Url::parse(section.edit_href())?;
        let resp = self
            .put_xml(&url, NETWORK_CONFIG_SECTION_MEDIA_TYPE, body)
            .await?;
        let doc = xml::parse(&resp)?;
        Task::from_node(doc.root_element())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SECTION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<NetworkConfigSection xmlns="http://www.vmware.com/vcloud/v1.5" xmlns:ovf="http://schemas.dmtf.org/ovf/envelope/1" href="https://vcd/api/vApp/vapp-1/networkConfigSection/">
    <ovf:Info>The configuration parameters for logical networks</ovf:Info>
    <Link rel="edit" type="application/vnd.vmware.vcloud.networkConfigSection+xml" href="https://vcd/api/vApp/vapp-1/networkConfigSection/"/>
    <NetworkConfig networkName="keep"><Configuration><FenceMode>bridged</FenceMode></Configuration></NetworkConfig>
    <NetworkConfig networkName="drop"><Configuration><FenceMode>isolated</FenceMode></Configuration></NetworkConfig>
</NetworkConfigSection>"#;

    fn section() -> NetworkConfigSection {
        NetworkConfigSection::parse(SECTION.to_owned()).unwrap()
    }

    #[test]
    fn parses_edit_link_and_names() {
        let s = section();
        assert_eq!(
            s.edit_href(),
            "https://vcd/api/vApp/vapp-1/networkConfigSection/"
        );
        assert_eq!(s.network_names(), ["keep", "drop"]);
        assert!(s.contains("drop"));
        assert!(!s.contains("other"));
    }

    #[test]
    fn removing_a_network_keeps_the_rest_verbatim() {
        let edited = section().without_network("drop").unwrap();
        let reparsed = NetworkConfigSection::parse(edited.clone()).unwrap();
        assert_eq!(reparsed.network_names(), ["keep"]);
        assert!(edited.contains("<ovf:Info>The configuration parameters"));
    }

    #[test]
    fn appending_a_network_places_it_last() {
        let config = NetworkConfig {
            name: "new".into(),
            fence_mode: FenceMode::Isolated,
            ip_scope: None,
            parent_network_href: None,
            firewall_enabled: true,
            nat_enabled: true,
        };
        let edited = section().with_network(&config.to_xml().unwrap()).unwrap();
        let reparsed = NetworkConfigSection::parse(edited).unwrap();
        assert_eq!(reparsed.network_names(), ["keep", "drop", "new"]);
    }

    #[test]
    fn network_config_xml_follows_schema_order() {
        let config = NetworkConfig {
            name: "vapp1_net".into(),
            fence_mode: FenceMode::NatRouted,
            ip_scope: Some(IpScope {
                gateway: Ipv4Addr::new(192, 168, 0, 1),
                netmask: Ipv4Addr::new(255, 255, 255, 0),
                dns1: Some("8.8.8.8".into()),
                dns2: Some(String::new()),
                dns_suffix: None,
                ip_range: Some(("192.168.0.10".into(), "192.168.0.20".into())),
            }),
            parent_network_href: Some("https://vcd/api/network/n-1".into()),
            firewall_enabled: true,
            nat_enabled: false,
        };
        let xml = config.to_xml().unwrap();
        assert_eq!(
            xml,
            concat!(
                r#"<NetworkConfig xmlns="http://www.vmware.com/vcloud/v1.5" networkName="vapp1_net">"#,
                "<Configuration><IpScopes><IpScope>",
                "<IsInherited>false</IsInherited>",
                "<Gateway>192.168.0.1</Gateway>",
                "<Netmask>255.255.255.0</Netmask>",
                "<Dns1>8.8.8.8</Dns1>",
                "<IpRanges><IpRange><StartAddress>192.168.0.10</StartAddress>",
                "<EndAddress>192.168.0.20</EndAddress></IpRange></IpRanges>",
                "</IpScope></IpScopes>",
                r#"<ParentNetwork href="https://vcd/api/network/n-1"/>"#,
                "<FenceMode>natRouted</FenceMode>",
                "<Features><NatService><IsEnabled>false</IsEnabled></NatService></Features>",
                "</Configuration></NetworkConfig>"
            )
        );
    }

    #[test]
    fn network_names_are_escaped() {
        let config = NetworkConfig {
            name: r#"a&b"c"#.into(),
            fence_mode: FenceMode::Bridged,
            ip_scope: None,
            parent_network_href: None,
            firewall_enabled: true,
            nat_enabled: true,
        };
        let xml = config.to_xml().unwrap();
        let doc = xml::parse(&xml).unwrap();
        assert_eq!(
            doc.root_element().attribute("networkName"),
            Some(r#"a&b"c"#)
        );
    }

    #[test]
    fn fence_mode_round_trips_through_strings() {
        for mode in [FenceMode::Bridged, FenceMode::Isolated, FenceMode::NatRouted] {
            assert_eq!(FenceMode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(FenceMode::parse("routed"), None);
    }
}
