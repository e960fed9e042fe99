// Namespaced XML accessors
//
// vCloud responses are namespaced XML documents. Every lookup in this crate
// goes through `VcdNode`, which matches elements by (namespace, local name)
// and always yields nodes in document order, so "first match" means the
// first element a reader would meet scanning the body top to bottom.

use roxmltree::{Document, Node};

use crate::error::Error;

/// The vCloud API 1.5+ namespace used by every core resource type.
pub const VCLOUD_NS: &str = "http://www.vmware.com/vcloud/v1.5";

/// OVF envelope namespace (`ovf:Info`, `ovf:name` on vApp networks).
pub const OVF_NS: &str = "http://schemas.dmtf.org/ovf/envelope/1";

/// Parse a response body into a read-only document tree.
pub fn parse(body: &str) -> Result<Document<'_>, Error> {
    Document::parse(body).map_err(Error::from)
}

/// Typed accessors over a parsed document node.
///
/// All element names are local names within [`VCLOUD_NS`]; elements in any
/// other namespace never match.
pub trait VcdNode<'a, 'input: 'a>: Sized {
    /// Does this node name the vCloud element `name`?
    fn is_vcd(self, name: &str) -> bool;

    /// Every descendant element named `name`, in document order. The node
    /// itself is included when it matches.
    fn vcd_descendants(self, name: &'static str) -> impl Iterator<Item = Node<'a, 'input>>;

    /// Direct children named `name`, in document order.
    fn vcd_children(self, name: &'static str) -> impl Iterator<Item = Node<'a, 'input>>;

    /// First element named `name` in document order.
    fn first_vcd(self, name: &'static str) -> Option<Node<'a, 'input>> {
        self.vcd_descendants(name).next()
    }

    /// First direct child named `name`.
    fn vcd_child(self, name: &'static str) -> Option<Node<'a, 'input>> {
        self.vcd_children(name).next()
    }

    /// Trimmed text of the first element named `name`, if it has any.
    fn first_vcd_text(self, name: &'static str) -> Option<&'a str> {
        self.first_vcd(name)
            .and_then(|n| n.text())
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// An attribute that must be present.
    fn required_attr(self, element: &'static str, attribute: &'static str)
    -> Result<&'a str, Error>;
}

impl<'a, 'input: 'a> VcdNode<'a, 'input> for Node<'a, 'input> {
    fn is_vcd(self, name: &str) -> bool {
        self.is_element()
            && self.tag_name().namespace() == Some(VCLOUD_NS)
            && self.tag_name().name() == name
    }

    fn vcd_descendants(self, name: &'static str) -> impl Iterator<Item = Node<'a, 'input>> {
        self.descendants().filter(move |n| n.is_vcd(name))
    }

    fn vcd_children(self, name: &'static str) -> impl Iterator<Item = Node<'a, 'input>> {
        self.children().filter(move |n| n.is_vcd(name))
    }

    fn required_attr(
        self,
        element: &'static str,
        attribute: &'static str,
    ) -> Result<&'a str, Error> {
        self.attribute(attribute)
            .ok_or(Error::MissingAttribute { element, attribute })
    }
}

/// Find a `<Link>` child by `rel` and (optionally) media `type`.
pub fn find_link<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    rel: &str,
    media_type: Option<&str>,
) -> Option<Node<'a, 'input>> {
    node.vcd_children("Link").find(|link| {
        link.attribute("rel") == Some(rel)
            && media_type.is_none_or(|t| link.attribute("type") == Some(t))
    })
}
