//! package.xml rendering

use mm_api::PackageDescriptor;

use crate::sfdc::soap::escape;

/// Render a descriptor as a Metadata API `package.xml`
pub fn render_package_xml(package: &PackageDescriptor, api_version: &str) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Package xmlns=\"http://soap.sforce.com/2006/04/metadata\">\n",
    );

    for (type_name, members) in package.types() {
        xml.push_str("    <types>\n");
        for member in members.names() {
            xml.push_str(&format!("        <members>{}</members>\n", escape(member)));
        }
        xml.push_str(&format!("        <name>{}</name>\n", escape(type_name)));
        xml.push_str("    </types>\n");
    }

    xml.push_str(&format!("    <version>{}</version>\n</Package>\n", escape(api_version)));
    xml
}
