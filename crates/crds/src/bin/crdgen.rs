//! Prints the CustomResourceDefinition manifests as YAML.
//!
//! ```sh
//! cargo run -p crds --bin crdgen > deploy/crds.yaml
//! ```

use crds::Vlan;
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&Vlan::crd())?);
    Ok(())
}
