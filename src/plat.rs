// CLASSIFICATION: COMMUNITY
// Filename: plat.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-01-20

//! Platform resource tree for the powershelf.
//!
//! Built once at startup and handed to the server; no ambient global.

use crate::node::StructNode;
use crate::nodes::bmc::BmcNode;
use crate::nodes::bulkinfo::BulkinfoNode;
use crate::nodes::efuse::{EfuseAllNode, EfuseNode, MAX_EFUSE_NUM, MIN_EFUSE_NUM};
use crate::nodes::fan::FanNode;
use crate::nodes::fruid::FruidNode;
use crate::nodes::inet::InetNode;
use crate::nodes::meminfo::MeminfoNode;
use crate::nodes::psu::{PsuNode, MAX_PSU_NUM, MIN_PSU_NUM};
use crate::nodes::swver::SwverNode;
use crate::tree::Tree;

/// Build the platform resource tree rooted at `/api`.
pub fn init_plat_tree() -> Tree {
    let mut api = Tree::new("api", Box::new(StructNode));

    let sys = api.add_child(Tree::new("sys", Box::new(StructNode)));

    sys.add_child(Tree::new("bulkinfo", Box::new(BulkinfoNode)));
    sys.add_child(Tree::new("swVersion", Box::new(SwverNode)));
    sys.add_child(Tree::new("bmc", Box::new(BmcNode)));
    sys.add_child(Tree::new("meminfo", Box::new(MeminfoNode)));
    sys.add_child(Tree::new("fan", Box::new(FanNode)));
    sys.add_child(Tree::new("inet", Box::new(InetNode)));
    sys.add_child(Tree::new("fruid", Box::new(FruidNode)));

    for i in MIN_PSU_NUM..=MAX_PSU_NUM {
        sys.add_child(Tree::new(format!("psu{i}"), Box::new(PsuNode::new(i))));
    }

    let efuses = sys.add_child(Tree::new("efuses", Box::new(StructNode)));
    efuses.add_child(Tree::new("efuseall", Box::new(EfuseAllNode)));
    for i in MIN_EFUSE_NUM..=MAX_EFUSE_NUM {
        efuses.add_child(Tree::new(format!("efuse{i}"), Box::new(EfuseNode::new(i))));
    }

    api
}
