//! A small taxonomy in the exporter's pipe-delimited format
//!
//! Hierarchy: 10 Natural Sciences (L1) > 20 Computer Science (L2) >
//! 30 AI & IP (L3) > 40 Graph Mining (L4) > 50 Graph Neural Networks (L5),
//! keywords 61 gnn and 62 message passing. A second L3 branch, 31 Energy,
//! carries venue 3. Venue 1 is unassigned and cites venues 2 and 3.

pub const NODE_ROWS: &str = "\
id|name|L4_name|L5_name|roles
1|VenueA|-|-|venue
2|VenueB|-|-|venue
3|VenueC|-|-|venue
10|Natural Sciences|-|-|L1
20|Computer Science|-|-|L2
30|AI & IP|-|-|L3
31|Energy|-|-|L3
40|cluster_40|Graph Mining|-|L4
50|topic_50|-|Graph Neural Networks|L5
61|gnn|-|-|is_L6
62|message passing|-|-|is_L6
";

pub const FULL_NAME_ROWS: &str = "\
id|full_name
1|Venue Alpha
1|Venue Arena
2|Venue Beta
";

pub const EDGE_ROWS: &str = "\
source|target|type|weight
20|10|specializes_L1|-
30|20|specializes_L2|-
31|20|specializes_L2|-
40|30|specializes_L3|-
50|40|specializes_L4|-
61|50|in_L5|-
62|50|in_L5|-
61|62|weight|4
62|61|weight|6
2|40|in_L4|0.8
2|30|in_L3|1
3|31|in_L3|1
1|2|cites|5
1|3|cites|1
";
