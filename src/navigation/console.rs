//! Navigation tree of the IoT management console.
//!
//! ```text
//! /login                                      [Login]
//! /domains                                    [Domains]
//! /domain/:id                                 [MainLayout, DomainHome]
//! /domain/:id/channels                        [MainLayout, Channels]
//! /domain/:id/channels/:channelId             [MainLayout, ChannelLayout, ChannelDetail]
//! /domain/:id/channels/:channelId/messages    [MainLayout, ChannelLayout, ChannelMessages]
//! /domain/:id/channels/:channelId/chart       [MainLayout, ChannelLayout, ChannelChart]
//! /                                           => /login
//! ```

use crate::navigation::resolver::{Navigator, Redirect};
use crate::navigation::tree::{RouteNode, RouteTree, TreeError};

pub const LOGIN: &str = "Login";
pub const DOMAINS: &str = "Domains";
pub const MAIN_LAYOUT: &str = "MainLayout";
pub const DOMAIN_HOME: &str = "DomainHome";
pub const CHANNELS: &str = "Channels";
pub const CHANNEL_LAYOUT: &str = "ChannelLayout";
pub const CHANNEL_DETAIL: &str = "ChannelDetail";
pub const CHANNEL_MESSAGES: &str = "ChannelMessages";
pub const CHANNEL_CHART: &str = "ChannelChart";

/// Build the console route tree.
pub fn route_tree() -> Result<RouteTree, TreeError> {
    let channel = RouteNode::new(":channelId")?
        .view(CHANNEL_LAYOUT)
        .child(RouteNode::new("")?.view(CHANNEL_DETAIL))
        .child(RouteNode::new("messages")?.view(CHANNEL_MESSAGES))
        .child(RouteNode::new("chart")?.view(CHANNEL_CHART));

    let domain = RouteNode::new(":id")?
        .view(MAIN_LAYOUT)
        .child(RouteNode::new("")?.view(DOMAIN_HOME))
        .child(
            RouteNode::new("channels")?
                .child(RouteNode::new("")?.view(CHANNELS))
                .child(channel),
        );

    RouteTree::new(
        RouteNode::new("")?
            .child(RouteNode::new("login")?.view(LOGIN))
            .child(RouteNode::new("domains")?.view(DOMAINS))
            .child(RouteNode::new("domain")?.child(domain)),
    )
}

/// Root-level redirects.
pub fn redirects() -> Vec<Redirect> {
    vec![Redirect::new("/", "/login")]
}

/// Navigator over the console tree with its redirects.
pub fn navigator() -> Result<Navigator, TreeError> {
    Ok(Navigator::new(route_tree()?, redirects()))
}
