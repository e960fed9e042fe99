// Discovery endpoints
//
// vApp query (paged), VMs inside a vApp, and per-entity metadata. Each call
// is one or more sequential GETs; nothing is fetched concurrently.

use tracing::{debug, trace};
use url::Url;

use crate::client::VcdClient;
use crate::error::Error;
use crate::models::{MetadataEntry, VAppRecord, VmRecord};
use crate::xml::{self, VcdNode, find_link};

/// Hard stop for `nextPage` chains that never terminate.
const MAX_QUERY_PAGES: usize = 1000;

impl VcdClient {
    /// List every vApp visible to the session.
    ///
    /// `GET /api/vApps/query`, following `Link rel="nextPage"` until the
    /// result set is exhausted.
    pub async fn list_vapps(&self) -> Result<Vec<VAppRecord>, Error> {
        let mut next = Some(self.api_url("vApps/query")?);
        let mut records = Vec::new();
        let mut pages = 0;

        while let Some(url) = next.take() {
            pages += 1;
            if pages > MAX_QUERY_PAGES {
                return Err(Error::Xml {
                    message: format!("vApp query exceeded {MAX_QUERY_PAGES} pages"),
                });
            }

            let body = self.get_xml(&url).await?;
            let doc = xml::parse(&body)?;
            let root = doc.root_element();

            for node in root.vcd_descendants("VAppRecord") {
                records.push(VAppRecord::from_node(node)?);
            }

            next = find_link(root, "nextPage", None)
                .and_then(|link| link.attribute("href"))
                .map(Url::parse)
                .transpose()?;
            trace!(page = pages, has_next = next.is_some(), "vApp query page");
        }

        debug!(count = records.len(), "listed vApps");
        Ok(records)
    }

    /// List the VMs of a vApp in document order.
    ///
    /// `GET {vapp_href}`
    pub async fn list_vms(&self, vapp_href: &str) -> Result<Vec<VmRecord>, Error> {
        let url = Url::parse(vapp_href)?;
        let body = self.get_xml(&url).await?;
        let doc = xml::parse(&body)?;

        let vms = doc
            .root_element()
            .vcd_descendants("Vm")
            .map(VmRecord::from_node)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(vapp = vapp_href, count = vms.len(), "listed VMs");
        Ok(vms)
    }

    /// Metadata entries attached to an entity.
    ///
    /// `GET {href}/metadata`
    pub async fn get_metadata(&self, href: &str) -> Result<Vec<MetadataEntry>, Error> {
        let url = Url::parse(&format!("{}/metadata", href.trim_end_matches('/')))?;
        let body = self.get_xml(&url).await?;
        let doc = xml::parse(&body)?;

        doc.root_element()
            .vcd_descendants("MetadataEntry")
            .map(MetadataEntry::from_node)
            .collect()
    }
}
