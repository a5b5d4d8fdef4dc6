#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::assert::Assert;
use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

pub const CATALOG_CSV: &str = "\
id,name,category,type,price,rating,platform,description
1,Hades,Roguelike,Action,24.99,4.9,PC,Escape the underworld
2,Celeste,Platformer,Indie,19.99,4.8,Switch,Climb the mountain
3,Stardew Valley,Simulation,Indie,14.99,4.9,PC,Farm life
4,\"Ori, and the Blind Forest\",Platformer,Indie,19.99,4.7,Xbox,A spirit guardian
";

/// A throwaway data directory plus a local catalog file; the network is
/// always off.
pub struct Shop {
    temp: TempDir,
}

impl Shop {
    pub fn new(csv: Option<&str>) -> Self {
        let temp = tempfile::Builder::new()
            .prefix("storefront-cli")
            .tempdir()
            .expect("tempdir");
        if let Some(csv) = csv {
            fs::write(temp.path().join("games.csv"), csv).expect("write csv");
        }
        Self { temp }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root().join("data")
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("storefront");
        cmd.env("STOREFRONT_DATA_PATH", self.data_dir())
            .env("STOREFRONT_LOCAL_CSV", self.root().join("games.csv"))
            .env("STOREFRONT_ONLINE", "0")
            .env("NO_COLOR", "1")
            .env_remove("STOREFRONT_RELAYS")
            .env_remove("STOREFRONT_SHEET_ID")
            .env_remove("STOREFRONT_SHEET_NAME")
            .env_remove("STOREFRONT_HTTP_TIMEOUT_SECS");
        cmd
    }

    pub fn json(&self, args: &[&str]) -> Assert {
        self.cmd().arg("--json").args(args).assert()
    }
}

pub fn parse_json(assert: &Assert) -> Value {
    serde_json::from_slice(&assert.get_output().stdout).expect("valid json")
}

pub fn stdout(assert: &Assert) -> String {
    String::from_utf8(assert.get_output().stdout.clone()).expect("utf-8 stdout")
}

pub fn stderr(assert: &Assert) -> String {
    String::from_utf8(assert.get_output().stderr.clone()).expect("utf-8 stderr")
}
