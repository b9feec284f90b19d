//! Wire types and client stub for `node.v1.NodeCoordinator`, generated from
//! `proto/node.proto` at build time.

#![allow(clippy::all, unreachable_pub)]

tonic::include_proto!("node.v1");
