//! SSNTP frame-type keys.
//!
//! The registry treats these purely as hashable identifiers and logs them
//! with `Debug`, which is the variant name (`Start`). Display and `as_str`
//! render the protocol spelling (`START`) for code that prints frames.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! frame_types {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Protocol spelling of this frame type
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

frame_types! {
    /// SSNTP ERROR frame types
    pub enum ErrorType {
        /// Frame type not understood by the receiver
        InvalidFrameType => "InvalidFrameType",
        /// Instance could not be started
        StartFailure => "StartFailure",
        /// Instance could not be stopped
        StopFailure => "StopFailure",
        /// Connection could not be established
        ConnectionFailure => "ConnectionFailure",
        /// Instance could not be restarted
        RestartFailure => "RestartFailure",
        /// Instance could not be deleted
        DeleteFailure => "DeleteFailure",
        /// Connection dropped mid-session
        ConnectionAborted => "ConnectionAborted",
        /// Cluster configuration was rejected
        InvalidConfiguration => "InvalidConfiguration",
        /// Volume attach failed
        AttachVolumeFailure => "AttachVolumeFailure",
        /// Volume detach failed
        DetachVolumeFailure => "DetachVolumeFailure",
        /// Public IP assignment failed
        AssignPublicIPFailure => "AssignPublicIPFailure",
        /// Public IP release failed
        UnassignPublicIPFailure => "UnassignPublicIPFailure",
    }
}

frame_types! {
    /// SSNTP EVENT frame types
    pub enum EventType {
        TenantAdded => "TenantAdded",
        TenantRemoved => "TenantRemoved",
        InstanceDeleted => "InstanceDeleted",
        InstanceStopped => "InstanceStopped",
        ConcentratorInstanceAdded => "ConcentratorInstanceAdded",
        PublicIPAssigned => "PublicIPAssigned",
        PublicIPUnassigned => "PublicIPUnassigned",
        TraceReport => "TraceReport",
        NodeConnected => "NodeConnected",
        NodeDisconnected => "NodeDisconnected",
    }
}

frame_types! {
    /// SSNTP COMMAND frame types
    pub enum Command {
        Connect => "CONNECT",
        Start => "START",
        Stop => "STOP",
        Stats => "STATS",
        Evacuate => "EVACUATE",
        Delete => "DELETE",
        Restart => "RESTART",
        AssignPublicIP => "AssignPublicIP",
        ReleasePublicIP => "ReleasePublicIP",
        Configure => "CONFIGURE",
        AttachVolume => "AttachVolume",
        DetachVolume => "DetachVolume",
        Status => "STATUS",
    }
}
